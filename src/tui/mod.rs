//! Terminal client: a pure state machine (`app`) driven by key events and
//! worker responses, a renderer (`view`) and a background request worker.

pub mod app;
pub mod filter;
pub mod form;
pub mod view;
pub mod worker;
