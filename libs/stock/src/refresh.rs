/// Bookkeeping for overlapping refreshes of one data set.
///
/// Every refresh takes a generation number when it starts. A completion is
/// applied only if no later-started refresh has already been applied, so a
/// slow reply can never overwrite a newer one.
#[derive(Debug, Default, Clone)]
pub(crate) struct RefreshState {
    issued: u64,
    applied: u64,
    in_flight: usize,
    error: Option<String>,
}

impl RefreshState {
    pub(crate) fn begin(&mut self) -> u64 {
        self.issued += 1;
        self.in_flight += 1;
        self.issued
    }

    /// Record a successful reply. Returns whether the caller should apply it.
    pub(crate) fn succeed(&mut self, generation: u64) -> bool {
        self.in_flight = self.in_flight.saturating_sub(1);

        if generation <= self.applied {
            return false;
        }
        self.applied = generation;
        self.error = None;
        true
    }

    /// Record a failed reply. Only the newest outcome sets the error indicator.
    pub(crate) fn fail(&mut self, generation: u64, message: String) {
        self.in_flight = self.in_flight.saturating_sub(1);

        if generation > self.applied {
            self.applied = generation;
            self.error = Some(message);
        }
    }

    /// Finish without applying anything and without superseding older replies.
    pub(crate) fn abandon(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
    }

    /// Supersede everything in flight, e.g. when the data set became empty.
    pub(crate) fn reset(&mut self) {
        self.issued += 1;
        self.applied = self.issued;
        self.error = None;
    }

    pub(crate) fn is_loading(&self) -> bool {
        self.in_flight > 0
    }

    pub(crate) fn error(&self) -> Option<String> {
        self.error.clone()
    }
}
