//! Concrete state entry handlers and table builder.
//!
//! Each state is one plain `fn` pointer: no closures, no dynamic dispatch
//! beyond the lock port, no heap.  Entry handlers never wait; anything that
//! happens later is a scheduler task.
//!
//! ```text
//!  CLOSED ──[press]──▶ (start task) ──▶ OPENING ──[burst done]──▶ OPEN
//!    ▲                                                             │ ▲
//!    │                                                 [hold done] │ └─[press: reset hold]
//!    │                                                             ▼
//!    └─────────────[burst done]─────────────────────────────── CLOSING
//!                                                     [press: set pending-open]
//! ```
//!
//! Burst layout for `ticks` pulses, relative to burst start (the entry
//! handler itself energises the first pulse; every later edge is a task):
//!
//! ```text
//!  relay  ┌──w──┐     ┌──w──┐     ┌──w──┐
//!  ───────┘     └──g──┘     └──g──┘     └──g──▶ terminal
//!         0     w    w+g                     ticks·(w+g)
//! ```

use log::{info, warn};

use super::context::{Action, EntryContext, Relay};
use super::{DoorState, StateDescriptor};
use crate::drivers::indicator::Indicator;
use crate::error::ScheduleError;

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table.  Called once at startup.
pub fn build_state_table() -> [StateDescriptor; DoorState::COUNT] {
    [
        // Index 0: Closed
        StateDescriptor {
            id: DoorState::Closed,
            name: "Closed",
            indicator: Indicator::Locked,
            on_enter: closed_enter,
        },
        // Index 1: Opening
        StateDescriptor {
            id: DoorState::Opening,
            name: "Opening",
            indicator: Indicator::Unlocking,
            on_enter: opening_enter,
        },
        // Index 2: Open
        StateDescriptor {
            id: DoorState::Open,
            name: "Open",
            indicator: Indicator::Unlocked,
            on_enter: open_enter,
        },
        // Index 3: Closing
        StateDescriptor {
            id: DoorState::Closing,
            name: "Closing",
            indicator: Indicator::Locking,
            on_enter: closing_enter,
        },
    ]
}

/// Tasks one burst occupies: a disable per pulse, an enable for every pulse
/// after the first, and the terminal transition.
pub const fn burst_task_count(ticks: u8) -> usize {
    2 * ticks as usize
}

/// Energise `relay` now and schedule the rest of a `ticks`-pulse burst
/// followed by a transition to `terminal`.  All or nothing: if the table
/// cannot hold the whole burst, the relay is not touched and nothing is
/// scheduled.
pub fn schedule_burst(
    ctx: &mut EntryContext<'_>,
    relay: Relay,
    ticks: u8,
    terminal: DoorState,
) -> Result<(), ScheduleError> {
    let needed = burst_task_count(ticks);
    let tracked_room = ctx.inflight.capacity() - ctx.inflight.len();
    if ctx.scheduler.available() < needed || tracked_room < needed {
        warn!(
            "burst on {:?}: needs {} slots, {} free",
            relay,
            needed,
            ctx.scheduler.available()
        );
        return Err(ScheduleError::CapacityExceeded);
    }

    let width = ctx.config.pulse_width_ms;
    let period = width + ctx.config.pulse_gap_ms;

    for tick in 0..u32::from(ticks) {
        let start = tick * period;
        if tick == 0 {
            ctx.set_relay(relay, true);
        } else {
            ctx.schedule(
                Action::SetRelay {
                    relay,
                    energised: true,
                },
                start,
            )?;
        }
        ctx.schedule(
            Action::SetRelay {
                relay,
                energised: false,
            },
            start + width,
        )?;
    }
    ctx.schedule(Action::Transition(terminal), u32::from(ticks) * period)?;
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════
//  CLOSED: bolt thrown, waiting for a request
// ═══════════════════════════════════════════════════════════════════════════

fn closed_enter(ctx: &mut EntryContext<'_>) -> Result<(), ScheduleError> {
    ctx.release_relays();
    info!("CLOSED: locked, relays released");
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════
//  OPENING: pulsing the open relay
// ═══════════════════════════════════════════════════════════════════════════

fn opening_enter(ctx: &mut EntryContext<'_>) -> Result<(), ScheduleError> {
    // Never drive both coils at once.
    ctx.lock.set_close_relay(false);
    let ticks = ctx.config.open_ticks;
    schedule_burst(ctx, Relay::Open, ticks, DoorState::Open)?;
    info!(
        "OPENING: {} pulses, open in {}ms",
        ticks,
        ctx.config.burst_duration_ms(ticks)
    );
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════
//  OPEN: bolt retracted, hold timer running
// ═══════════════════════════════════════════════════════════════════════════

fn open_enter(ctx: &mut EntryContext<'_>) -> Result<(), ScheduleError> {
    ctx.release_relays();
    if ctx.service_mode {
        info!("OPEN: service mode, waiting for next toggle");
        return Ok(());
    }
    let hold = ctx.config.open_hold_ms;
    ctx.schedule(Action::Transition(DoorState::Closing), hold)?;
    info!("OPEN: locking again in {}ms", hold);
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════
//  CLOSING: pulsing the close relay
// ═══════════════════════════════════════════════════════════════════════════

fn closing_enter(ctx: &mut EntryContext<'_>) -> Result<(), ScheduleError> {
    ctx.lock.set_open_relay(false);
    let ticks = ctx.config.close_ticks;
    schedule_burst(ctx, Relay::Close, ticks, DoorState::Closed)?;
    info!(
        "CLOSING: {} pulses, locked in {}ms",
        ticks,
        ctx.config.burst_duration_ms(ticks)
    );
    Ok(())
}
