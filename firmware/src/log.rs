#![cfg_attr(not(target_os = "none"), allow(dead_code))]

//! Round lifecycle logging. Goes out over RTT on the board and to stdout on
//! host builds.

use core::time::Duration;

use reaction_core::results::{Classification, RoundOutcome, Summary};

const fn classification_label(classification: Classification) -> &'static str {
    match classification {
        Classification::Valid => "valid",
        Classification::TooFast => "too-fast",
        Classification::TooSlow => "too-slow",
        Classification::NoResponse => "no-response",
    }
}

fn millis(duration: Duration) -> u32 {
    u32::try_from(duration.as_millis()).unwrap_or(u32::MAX)
}

pub fn round_started(number: u8, of: u8, delay: Duration) {
    emit_round_started(number, of, millis(delay));
}

pub fn round_resolved(number: u8, outcome: &RoundOutcome) {
    emit_round_resolved(
        number,
        classification_label(outcome.classification),
        millis(outcome.elapsed),
    );
}

pub fn session_finished(summary: &Summary) {
    match summary {
        Summary::NoData => emit_session_finished(None, 0),
        Summary::Mean {
            mean, valid_rounds, ..
        } => emit_session_finished(Some(millis(*mean)), *valid_rounds),
    }
}

pub fn edge_captured(elapsed: Duration) {
    emit_edge_captured(millis(elapsed));
}

pub fn console_fault(what: &'static str) {
    emit_console_fault(what);
}

/// Bytes typed while a session owned the console, discarded afterwards.
pub fn stale_input_dropped(count: usize) {
    if count > 0 {
        emit_stale_input_dropped(count);
    }
}

pub fn boot(tick_ms: u32) {
    emit_boot(tick_ms);
}

pub fn console_exited() {
    emit_console_exited();
}

pub fn round_not_started(number: u8) {
    emit_round_not_started(number);
}

pub fn results_full(number: u8) {
    emit_results_full(number);
}

#[cfg(target_os = "none")]
fn emit_round_started(number: u8, of: u8, delay_ms: u32) {
    defmt::info!("round {}/{} delay={}ms", number, of, delay_ms);
}

#[cfg(not(target_os = "none"))]
fn emit_round_started(number: u8, of: u8, delay_ms: u32) {
    println!("round {}/{} delay={}ms", number, of, delay_ms);
}

#[cfg(target_os = "none")]
fn emit_round_resolved(number: u8, label: &'static str, elapsed_ms: u32) {
    defmt::info!("round {} {} t={}ms", number, label, elapsed_ms);
}

#[cfg(not(target_os = "none"))]
fn emit_round_resolved(number: u8, label: &'static str, elapsed_ms: u32) {
    println!("round {} {} t={}ms", number, label, elapsed_ms);
}

#[cfg(target_os = "none")]
fn emit_session_finished(mean_ms: Option<u32>, valid_rounds: usize) {
    match mean_ms {
        Some(mean) => defmt::info!("session mean={}ms valid={}", mean, valid_rounds),
        None => defmt::info!("session no valid responses"),
    }
}

#[cfg(not(target_os = "none"))]
fn emit_session_finished(mean_ms: Option<u32>, valid_rounds: usize) {
    match mean_ms {
        Some(mean) => println!("session mean={}ms valid={}", mean, valid_rounds),
        None => println!("session no valid responses"),
    }
}

#[cfg(target_os = "none")]
fn emit_edge_captured(elapsed_ms: u32) {
    defmt::debug!("button edge captured t={}ms", elapsed_ms);
}

#[cfg(not(target_os = "none"))]
fn emit_edge_captured(elapsed_ms: u32) {
    println!("button edge captured t={}ms", elapsed_ms);
}

#[cfg(target_os = "none")]
fn emit_console_fault(what: &'static str) {
    defmt::warn!("console: {}", what);
}

#[cfg(not(target_os = "none"))]
fn emit_console_fault(what: &'static str) {
    println!("console: {}", what);
}

#[cfg(target_os = "none")]
fn emit_stale_input_dropped(count: usize) {
    defmt::debug!("dropped {} bytes typed during the session", count);
}

#[cfg(not(target_os = "none"))]
fn emit_stale_input_dropped(count: usize) {
    println!("dropped {} bytes typed during the session", count);
}

#[cfg(target_os = "none")]
fn emit_console_exited() {
    defmt::info!("console exited; idling");
}

#[cfg(not(target_os = "none"))]
fn emit_console_exited() {
    println!("console exited; idling");
}

#[cfg(target_os = "none")]
fn emit_round_not_started(number: u8) {
    defmt::warn!("round {} not started: sequencer not idle", number);
}

#[cfg(not(target_os = "none"))]
fn emit_round_not_started(number: u8) {
    println!("round {} not started: sequencer not idle", number);
}

#[cfg(target_os = "none")]
fn emit_results_full(number: u8) {
    defmt::warn!("results log full; round {} dropped", number);
}

#[cfg(not(target_os = "none"))]
fn emit_results_full(number: u8) {
    println!("results log full; round {} dropped", number);
}

#[cfg(target_os = "none")]
fn emit_boot(tick_ms: u32) {
    defmt::info!("reaction timer up, tick={}ms", tick_ms);
}

#[cfg(not(target_os = "none"))]
fn emit_boot(tick_ms: u32) {
    println!("reaction timer up, tick={}ms", tick_ms);
}
