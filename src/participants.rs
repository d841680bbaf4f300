//! Participant identities and signing quorums.
//!
//! A participant is identified by a positive integer which doubles as the
//! abscissa its key share is evaluated at. Every per-participant value in
//! this crate is keyed by that identity, never by a position inside some
//! signer array.
use std::collections::{BTreeMap, BTreeSet};

use derive_more::{Deref, Display, From, Into};
use frost_core::Field;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::{
    crypto::{
        ciphersuite::{Ciphersuite, Scalar},
        lagrange::compute_lagrange_coefficient,
    },
    errors::ProtocolError,
};

/// Identity of a protocol participant, `1..=n`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    From,
    Into,
)]
pub struct Participant(u32);

impl Participant {
    /// The evaluation abscissa of this participant as a field element.
    ///
    /// Built with double-and-add over the field's own arithmetic so that it
    /// works for every ciphersuite regardless of its scalar encoding.
    pub fn scalar<C: Ciphersuite>(self) -> Scalar<C> {
        let one = <C::Group as frost_core::Group>::Field::one();
        let mut acc = <C::Group as frost_core::Group>::Field::zero();
        for bit in (0..u32::BITS).rev() {
            acc = acc + acc;
            if (self.0 >> bit) & 1 == 1 {
                acc = acc + one;
            }
        }
        acc
    }
}

/// A sorted list of distinct participants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantList {
    participants: Vec<Participant>,
}

impl ParticipantList {
    /// Builds the list, returning `None` if it contains duplicates.
    pub fn new(participants: &[Participant]) -> Option<Self> {
        let set: BTreeSet<Participant> = participants.iter().copied().collect();
        if set.len() != participants.len() {
            return None;
        }
        Some(Self {
            participants: set.into_iter().collect(),
        })
    }

    /// The participants `1..=n`.
    pub fn range(n: u32) -> Self {
        Self {
            participants: (1..=n).map(Participant::from).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub fn contains(&self, participant: Participant) -> bool {
        self.participants.binary_search(&participant).is_ok()
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn iter(&self) -> impl Iterator<Item = Participant> + '_ {
        self.participants.iter().copied()
    }

    /// Every participant except `me`.
    pub fn others(&self, me: Participant) -> impl Iterator<Item = Participant> + '_ {
        self.iter().filter(move |p| *p != me)
    }

    /// The abscissas of the whole list.
    pub fn scalars<C: Ciphersuite>(&self) -> Vec<Scalar<C>> {
        self.iter().map(Participant::scalar::<C>).collect()
    }

    /// Lagrange coefficient of `participant` for interpolating at zero over
    /// this list.
    pub fn lagrange<C: Ciphersuite>(
        &self,
        participant: Participant,
    ) -> Result<Scalar<C>, ProtocolError> {
        let ids = self.scalars::<C>();
        compute_lagrange_coefficient::<C>(&ids, &participant.scalar::<C>(), None)
    }
}

/// Secret scalars keyed by participant, wiped when dropped.
#[derive(Deref)]
pub struct SecretShares<S: Zeroize>(BTreeMap<Participant, S>);

impl<S: Zeroize> Default for SecretShares<S> {
    fn default() -> Self {
        Self(BTreeMap::new())
    }
}

impl<S: Zeroize> SecretShares<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, participant: Participant, value: S) {
        if let Some(mut old) = self.0.insert(participant, value) {
            old.zeroize();
        }
    }
}

impl<S: Zeroize> FromIterator<(Participant, S)> for SecretShares<S> {
    fn from_iter<I: IntoIterator<Item = (Participant, S)>>(iter: I) -> Self {
        let mut out = Self::new();
        for (p, v) in iter {
            out.insert(p, v);
        }
        out
    }
}

impl<S: Zeroize> Drop for SecretShares<S> {
    fn drop(&mut self) {
        self.0.values_mut().for_each(Zeroize::zeroize);
    }
}
