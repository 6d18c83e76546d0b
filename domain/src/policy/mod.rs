//! Domain policies that constrain turn scheduling.

pub mod retry;
