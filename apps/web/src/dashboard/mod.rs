// Dashboard: the per-browser document list, preview modal, delete and PDF download.

pub mod handlers;
pub mod state;
