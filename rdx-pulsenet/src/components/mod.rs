//! Contains the building blocks a network is assembled from.
//!
//! This module provides the node state machines (which react to pulses) and
//! the watchers (which observe the event stream without altering it). The
//! `Network` owns collections of both to drive a simulation.

pub mod node;
pub mod watcher;
