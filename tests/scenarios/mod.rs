//! Scenario-based tests for checkrun

#[path = "../helpers.rs"]
mod helpers;

mod conditional_steps;
mod failure_handling;
mod success_chain;
mod trigger_matching;
