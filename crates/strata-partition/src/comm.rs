//! Message-passing abstraction between worker processes.
//!
//! Messages are opaque byte payloads tagged with the collective that
//! produced them. Delivery between each ordered pair of ranks is FIFO,
//! so lock-step collectives never need to reorder.

use std::sync::mpsc::{self, Receiver, Sender};

use strata_types::{Rank, StrataError, StrataResult};

/// Message tag identifying the protocol step a payload belongs to.
pub type Tag = u32;

/// Well-known tags used by the collectives in this crate.
pub mod tags {
    use super::Tag;

    pub const BARRIER: Tag = 1;
    pub const GATHER: Tag = 2;
    pub const BROADCAST: Tag = 3;
    pub const ALL_TO_ALL: Tag = 4;
}

/// Transport between cooperating workers.
///
/// Every rank must call collective operations built on this trait in
/// the same order; a mismatched tag is reported as a
/// [`StrataError::Communication`] error.
pub trait Communicator: Send {
    /// This worker's rank.
    fn rank(&self) -> Rank;

    /// Number of workers.
    fn size(&self) -> usize;

    /// Queue `payload` for `to`. Does not block.
    fn send(&self, to: Rank, tag: Tag, payload: Vec<u8>) -> StrataResult<()>;

    /// Block until the next message from `from` arrives.
    fn receive(&self, from: Rank, tag: Tag) -> StrataResult<Vec<u8>>;

    /// Block until every worker has reached the barrier.
    fn barrier(&self) -> StrataResult<()>;

    fn name(&self) -> &str;
}

/// Communicator for single-process runs. Every collective is a no-op.
#[derive(Debug, Default, Clone, Copy)]
pub struct SingleProcess;

impl Communicator for SingleProcess {
    fn rank(&self) -> Rank {
        Rank::ROOT
    }

    fn size(&self) -> usize {
        1
    }

    fn send(&self, to: Rank, _tag: Tag, _payload: Vec<u8>) -> StrataResult<()> {
        Err(StrataError::Communication(format!(
            "single process cannot send to {to}"
        )))
    }

    fn receive(&self, from: Rank, _tag: Tag) -> StrataResult<Vec<u8>> {
        Err(StrataError::Communication(format!(
            "single process cannot receive from {from}"
        )))
    }

    fn barrier(&self) -> StrataResult<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "single_process"
    }
}

struct Envelope {
    tag: Tag,
    payload: Vec<u8>,
}

/// In-memory communicator connecting worker threads.
///
/// One unbounded `mpsc` channel per ordered pair of ranks. A peer that
/// exits drops its senders, which surfaces as a communication error on
/// the receiving side rather than a hang.
pub struct ChannelCommunicator {
    rank: Rank,
    outboxes: Vec<Option<Sender<Envelope>>>,
    inboxes: Vec<Option<Receiver<Envelope>>>,
}

impl ChannelCommunicator {
    /// Creates `size` connected endpoints, indexed by rank.
    pub fn cluster(size: usize) -> StrataResult<Vec<Self>> {
        if size == 0 {
            return Err(StrataError::InvalidConfig(
                "A cluster needs at least one worker".into(),
            ));
        }

        let mut outboxes: Vec<Vec<Option<Sender<Envelope>>>> =
            (0..size).map(|_| (0..size).map(|_| None).collect()).collect();
        let mut inboxes: Vec<Vec<Option<Receiver<Envelope>>>> =
            (0..size).map(|_| (0..size).map(|_| None).collect()).collect();

        for src in 0..size {
            for dst in 0..size {
                if src == dst {
                    continue;
                }
                let (tx, rx) = mpsc::channel();
                outboxes[src][dst] = Some(tx);
                inboxes[dst][src] = Some(rx);
            }
        }

        Ok(outboxes
            .into_iter()
            .zip(inboxes)
            .enumerate()
            .map(|(r, (outboxes, inboxes))| Self {
                rank: Rank(r as u32),
                outboxes,
                inboxes,
            })
            .collect())
    }

    fn outbox(&self, to: Rank) -> StrataResult<&Sender<Envelope>> {
        self.outboxes
            .get(to.index())
            .and_then(Option::as_ref)
            .ok_or_else(|| {
                StrataError::Communication(format!("{} has no channel to {to}", self.rank))
            })
    }

    fn inbox(&self, from: Rank) -> StrataResult<&Receiver<Envelope>> {
        self.inboxes
            .get(from.index())
            .and_then(Option::as_ref)
            .ok_or_else(|| {
                StrataError::Communication(format!("{} has no channel from {from}", self.rank))
            })
    }
}

impl Communicator for ChannelCommunicator {
    fn rank(&self) -> Rank {
        self.rank
    }

    fn size(&self) -> usize {
        self.outboxes.len()
    }

    fn send(&self, to: Rank, tag: Tag, payload: Vec<u8>) -> StrataResult<()> {
        self.outbox(to)?
            .send(Envelope { tag, payload })
            .map_err(|_| StrataError::Communication(format!("{to} disconnected")))
    }

    fn receive(&self, from: Rank, tag: Tag) -> StrataResult<Vec<u8>> {
        let envelope = self
            .inbox(from)?
            .recv()
            .map_err(|_| StrataError::Communication(format!("{from} disconnected")))?;
        if envelope.tag != tag {
            return Err(StrataError::Communication(format!(
                "{} expected tag {tag} from {from}, got {}",
                self.rank, envelope.tag
            )));
        }
        Ok(envelope.payload)
    }

    /// Two-phase barrier through the root: arrive, then release.
    fn barrier(&self) -> StrataResult<()> {
        let size = self.size();
        if self.rank.is_root() {
            for r in 1..size {
                self.receive(Rank(r as u32), tags::BARRIER)?;
            }
            for r in 1..size {
                self.send(Rank(r as u32), tags::BARRIER, Vec::new())?;
            }
        } else {
            self.send(Rank::ROOT, tags::BARRIER, Vec::new())?;
            self.receive(Rank::ROOT, tags::BARRIER)?;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "channel"
    }
}
