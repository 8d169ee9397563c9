//! Bounded command FIFO between the producer core and the renderer core.
//!
//! This is the only queue in the system. It is an embassy [`Channel`]
//! guarded by a [`CriticalSectionRawMutex`], which on the RP2040 maps to the
//! hardware spinlock shared by both cores.
//!
//! # Single producer
//!
//! A [`Command`] travels as one message, so an opcode can never be paired
//! with another push's operand. Ordering across pushes is still only
//! meaningful for one producer: `set_pixel` is three commands that rely on
//! the cursor registers not being touched in between. [`CommandProducer`]
//! is therefore not `Clone`, takes `&mut self`, and is only handed out once
//! by [`crate::GpuShared::split`].

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, Receiver, Sender};

use crate::command::Command;
use crate::config::COMMAND_QUEUE_DEPTH;

/// The shared command queue.
pub type CommandChannel = Channel<CriticalSectionRawMutex, Command, COMMAND_QUEUE_DEPTH>;

/// Push side of the command queue.
pub struct CommandProducer<'a> {
    tx: Sender<'a, CriticalSectionRawMutex, Command, COMMAND_QUEUE_DEPTH>,
}

impl<'a> CommandProducer<'a> {
    pub(crate) fn new(channel: &'a CommandChannel) -> Self {
        Self {
            tx: channel.sender(),
        }
    }

    /// Enqueue a command, waiting while the queue is full.
    ///
    /// There is no timeout: a full queue is flow control, not failure.
    pub async fn push(&mut self, command: Command) {
        self.tx.send(command).await;
    }

    /// Enqueue without waiting; hands the command back if the queue is full.
    pub fn try_push(&mut self, command: Command) -> Result<(), Command> {
        self.tx.try_send(command).map_err(|err| match err {
            embassy_sync::channel::TrySendError::Full(command) => command,
        })
    }
}

/// Pop side of the command queue.
pub struct CommandConsumer<'a> {
    rx: Receiver<'a, CriticalSectionRawMutex, Command, COMMAND_QUEUE_DEPTH>,
}

impl<'a> CommandConsumer<'a> {
    pub(crate) fn new(channel: &'a CommandChannel) -> Self {
        Self {
            rx: channel.receiver(),
        }
    }

    /// Remove the oldest command, waiting until one is available.
    pub async fn pop(&mut self) -> Command {
        self.rx.receive().await
    }

    /// Remove the oldest command if one is queued.
    pub fn try_pop(&mut self) -> Option<Command> {
        self.rx.try_receive().ok() // ok: TryReceiveError::Empty maps to None; channel never closes
    }
}
