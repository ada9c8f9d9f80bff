//! Collective operations built on [`Communicator`] point-to-point messages.
//!
//! All ranks must enter each collective in the same order. Payloads are
//! bincode-encoded. Reductions combine contributions in rank order so
//! every rank obtains a bit-identical result.

use serde::de::DeserializeOwned;
use serde::Serialize;
use strata_types::{Rank, StrataError, StrataResult};

use crate::comm::{tags, Communicator};

pub fn encode<T: Serialize + ?Sized>(value: &T) -> StrataResult<Vec<u8>> {
    bincode::serialize(value).map_err(|e| StrataError::Serialization(e.to_string()))
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> StrataResult<T> {
    bincode::deserialize(bytes).map_err(|e| StrataError::Serialization(e.to_string()))
}

fn peers(comm: &dyn Communicator) -> impl Iterator<Item = Rank> + '_ {
    let me = comm.rank();
    (0..comm.size() as u32).map(Rank).filter(move |&r| r != me)
}

/// Collects one payload per rank on the root, in rank order.
///
/// Non-root ranks receive `None`.
pub fn gather(comm: &dyn Communicator, payload: Vec<u8>) -> StrataResult<Option<Vec<Vec<u8>>>> {
    if !comm.rank().is_root() {
        comm.send(Rank::ROOT, tags::GATHER, payload)?;
        return Ok(None);
    }
    let mut all = Vec::with_capacity(comm.size());
    all.push(payload);
    for r in 1..comm.size() as u32 {
        all.push(comm.receive(Rank(r), tags::GATHER)?);
    }
    Ok(Some(all))
}

/// Distributes the root's payload to every rank.
///
/// The root must pass `Some`; other ranks pass `None`.
pub fn broadcast(comm: &dyn Communicator, payload: Option<Vec<u8>>) -> StrataResult<Vec<u8>> {
    if comm.rank().is_root() {
        let payload = payload.ok_or_else(|| {
            StrataError::Communication("Root must supply the broadcast payload".into())
        })?;
        for r in peers(comm) {
            comm.send(r, tags::BROADCAST, payload.clone())?;
        }
        Ok(payload)
    } else {
        comm.receive(Rank::ROOT, tags::BROADCAST)
    }
}

/// Every rank's value, in rank order, on every rank.
pub fn all_gather<T>(comm: &dyn Communicator, value: &T) -> StrataResult<Vec<T>>
where
    T: Serialize + DeserializeOwned,
{
    let gathered = gather(comm, encode(value)?)?;
    let packed = match gathered {
        Some(parts) => Some(encode(&parts)?),
        None => None,
    };
    let parts: Vec<Vec<u8>> = decode(&broadcast(comm, packed)?)?;
    parts.iter().map(|p| decode(p)).collect()
}

/// Element-wise sum of equal-length vectors across ranks.
pub fn all_reduce_sum_u64(comm: &dyn Communicator, values: &[u64]) -> StrataResult<Vec<u64>> {
    let all: Vec<Vec<u64>> = all_gather(comm, &values.to_vec())?;
    let mut sum = vec![0u64; values.len()];
    for contribution in &all {
        if contribution.len() != sum.len() {
            return Err(StrataError::Communication(format!(
                "Reduction length mismatch: {} vs {}",
                contribution.len(),
                sum.len()
            )));
        }
        for (s, v) in sum.iter_mut().zip(contribution) {
            *s += v;
        }
    }
    Ok(sum)
}

/// Sum of one scalar per rank, accumulated in rank order.
pub fn all_reduce_sum_f64(comm: &dyn Communicator, value: f64) -> StrataResult<f64> {
    let all: Vec<f64> = all_gather(comm, &value)?;
    Ok(all.iter().sum())
}

/// Logical AND across ranks.
pub fn all_reduce_and(comm: &dyn Communicator, flag: bool) -> StrataResult<bool> {
    let all: Vec<bool> = all_gather(comm, &flag)?;
    Ok(all.into_iter().all(|f| f))
}

/// Personalised exchange: `outgoing[r]` goes to rank `r`, and the result
/// holds the payload each rank sent here, indexed by source rank.
///
/// The slot for this rank passes through unchanged.
pub fn all_to_all(comm: &dyn Communicator, outgoing: Vec<Vec<u8>>) -> StrataResult<Vec<Vec<u8>>> {
    let size = comm.size();
    if outgoing.len() != size {
        return Err(StrataError::Communication(format!(
            "all_to_all needs {size} payloads, got {}",
            outgoing.len()
        )));
    }
    let me = comm.rank().index();
    let mut incoming: Vec<Vec<u8>> = vec![Vec::new(); size];
    for (r, payload) in outgoing.into_iter().enumerate() {
        if r == me {
            incoming[r] = payload;
        } else {
            comm.send(Rank(r as u32), tags::ALL_TO_ALL, payload)?;
        }
    }
    for r in peers(comm) {
        incoming[r.index()] = comm.receive(r, tags::ALL_TO_ALL)?;
    }
    Ok(incoming)
}
