use crate::signaling::HandleId;

struct Tracked<H> {
    id: HandleId,
    handle: H,
    live: bool,
}

/// Holds the handle of one kind (control channel or media session) for one
/// peer. While the current handle is still connecting, a second one may wait
/// next to it; whichever completes first stays, the other one is handed back
/// to be closed.
pub struct Slot<H> {
    primary: Tracked<H>,
    contender: Option<Tracked<H>>,
}

/// Result of [`Slot::mark_live`].
pub enum Liveness<H> {
    /// The handle is now the live one; `discarded` lost the race.
    Promoted { discarded: Option<H> },
    /// The handle completed after another one was already live.
    Late(H),
    /// The handle does not belong to this slot.
    Unknown,
}

/// Result of [`Slot::release`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Release {
    /// The waiting duplicate ended; the slot is unchanged otherwise.
    Contender,
    /// The current handle ended and the waiting duplicate took its place.
    Replaced,
    /// The current handle ended and nothing is left.
    Emptied,
    Unknown,
}

impl<H> Slot<H> {
    pub fn new(id: HandleId, handle: H) -> Self {
        Self {
            primary: Tracked {
                id,
                handle,
                live: false,
            },
            contender: None,
        }
    }

    pub fn is_live(&self) -> bool {
        self.primary.live
    }

    pub fn current_id(&self) -> HandleId {
        self.primary.id
    }

    pub fn current(&self) -> &H {
        &self.primary.handle
    }

    pub fn contains(&self, id: HandleId) -> bool {
        self.primary.id == id || self.contender.as_ref().is_some_and(|c| c.id == id)
    }

    pub fn get(&self, id: HandleId) -> Option<&H> {
        if self.primary.id == id {
            return Some(&self.primary.handle);
        }
        self.contender
            .as_ref()
            .filter(|c| c.id == id)
            .map(|c| &c.handle)
    }

    /// Offers a second handle. Returns it back when it cannot be kept: the slot
    /// already has a live handle or a waiting duplicate.
    pub fn offer(&mut self, id: HandleId, handle: H) -> Option<H> {
        if self.primary.live || self.contender.is_some() {
            return Some(handle);
        }
        self.contender = Some(Tracked {
            id,
            handle,
            live: false,
        });
        None
    }

    pub fn mark_live(&mut self, id: HandleId) -> Liveness<H> {
        if self.primary.id == id {
            self.primary.live = true;
            return Liveness::Promoted {
                discarded: self.contender.take().map(|c| c.handle),
            };
        }

        match self.contender.take() {
            Some(contender) if contender.id == id => {
                if self.primary.live {
                    return Liveness::Late(contender.handle);
                }
                let previous = std::mem::replace(
                    &mut self.primary,
                    Tracked {
                        live: true,
                        ..contender
                    },
                );
                Liveness::Promoted {
                    discarded: Some(previous.handle),
                }
            }
            other => {
                self.contender = other;
                Liveness::Unknown
            }
        }
    }

    /// Forgets a handle that ended. On [`Release::Emptied`] the caller drops
    /// the slot.
    pub fn release(&mut self, id: HandleId) -> Release {
        if self.contender.as_ref().is_some_and(|c| c.id == id) {
            self.contender = None;
            return Release::Contender;
        }
        if self.primary.id != id {
            return Release::Unknown;
        }
        match self.contender.take() {
            Some(contender) => {
                self.primary = contender;
                Release::Replaced
            }
            None => Release::Emptied,
        }
    }

    pub fn into_handles(self) -> Vec<H> {
        let mut handles = vec![self.primary.handle];
        if let Some(contender) = self.contender {
            handles.push(contender.handle);
        }
        handles
    }
}
