// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pressproof-worker: the message protocol and the isolated worker that
// executes one command at a time.

pub mod dispatch;
pub mod engine;
pub mod protocol;

pub use dispatch::execute;
pub use engine::Worker;
pub use protocol::{Command, CommandKind, Event};
