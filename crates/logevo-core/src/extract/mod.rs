//! Turning source text into method fragments and logging call sites.

pub mod calls;
pub mod canonical;
pub mod java;
