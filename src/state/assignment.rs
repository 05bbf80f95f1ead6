use thiserror::Error;

/// Where a team stands in the check-in and domain assignment flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignmentPhase {
    /// Registered but not yet seen at the desk.
    Registered,
    /// Checked in; may spin.
    CheckedIn,
    /// The wheel is turning for this team.
    Spinning,
    /// The wheel landed; waiting for the operator to confirm.
    Pending {
        /// Label the wheel landed on.
        label: String,
    },
    /// Domain confirmed and locked until an explicit reset.
    Assigned {
        /// Confirmed domain.
        label: String,
    },
}

/// Events the desk applies to a team.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignmentEvent {
    /// Operator checks the team in.
    CheckIn,
    /// A spin begins (first spin or re-spin of an unconfirmed result).
    SpinStarted,
    /// The wheel finished on `label`.
    SpinLanded {
        /// Revealed label.
        label: String,
    },
    /// The wheel could not complete the spin.
    SpinAborted,
    /// Operator confirms the pending label.
    Confirm {
        /// Label the operator saw.
        label: String,
    },
    /// Operator throws the pending result away.
    Discard,
    /// Operator clears a confirmed domain.
    Reset,
}

/// Error returned when an event does not apply to the current phase.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// Phase the team was in.
    pub from: AssignmentPhase,
    /// Rejected event.
    pub event: AssignmentEvent,
}

/// Per-team lifecycle with a version bumped on every accepted event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentMachine {
    phase: AssignmentPhase,
    version: usize,
}

impl Default for AssignmentMachine {
    fn default() -> Self {
        Self {
            phase: AssignmentPhase::Registered,
            version: 0,
        }
    }
}

impl AssignmentMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the phase from what the stores know about a team.
    pub fn restore(checked_in: bool, domain: Option<&str>) -> Self {
        let phase = match domain.filter(|domain| !domain.is_empty()) {
            Some(label) => AssignmentPhase::Assigned {
                label: label.to_string(),
            },
            None if checked_in => AssignmentPhase::CheckedIn,
            None => AssignmentPhase::Registered,
        };
        Self { phase, version: 0 }
    }

    pub fn phase(&self) -> &AssignmentPhase {
        &self.phase
    }

    pub fn version(&self) -> usize {
        self.version
    }

    pub fn is_checked_in(&self) -> bool {
        self.phase != AssignmentPhase::Registered
    }

    /// Confirmed domain, if any.
    pub fn assigned(&self) -> Option<&str> {
        match &self.phase {
            AssignmentPhase::Assigned { label } => Some(label),
            _ => None,
        }
    }

    /// Revealed but unconfirmed label, if any.
    pub fn pending(&self) -> Option<&str> {
        match &self.phase {
            AssignmentPhase::Pending { label } => Some(label),
            _ => None,
        }
    }

    /// Catch up with a check-in recorded by another desk. Never moves a team backwards.
    pub fn absorb(&mut self, checked_in: bool, domain: Option<&str>) {
        if self.phase != AssignmentPhase::Registered {
            return;
        }
        let restored = Self::restore(checked_in, domain);
        if restored.phase != self.phase {
            self.phase = restored.phase;
            self.version += 1;
        }
    }

    /// Apply `event`, returning the new phase.
    pub fn apply(&mut self, event: AssignmentEvent) -> Result<&AssignmentPhase, InvalidTransition> {
        self.phase = self.compute_transition(event)?;
        self.version += 1;
        Ok(&self.phase)
    }

    /// Check whether `event` would be accepted without applying it.
    pub fn can_apply(&self, event: AssignmentEvent) -> Result<(), InvalidTransition> {
        self.compute_transition(event).map(|_| ())
    }

    fn compute_transition(
        &self,
        event: AssignmentEvent,
    ) -> Result<AssignmentPhase, InvalidTransition> {
        use AssignmentEvent as E;
        use AssignmentPhase as P;

        let next = match (&self.phase, event) {
            (P::Registered, E::CheckIn) => P::CheckedIn,
            (P::CheckedIn | P::Pending { .. }, E::SpinStarted) => P::Spinning,
            (P::Spinning, E::SpinLanded { label }) => P::Pending { label },
            (P::Spinning, E::SpinAborted) => P::CheckedIn,
            (P::Pending { label: pending }, E::Confirm { label }) if *pending == label => {
                P::Assigned { label }
            }
            (P::Pending { .. }, E::Discard) => P::CheckedIn,
            (P::Assigned { .. }, E::Reset) => P::CheckedIn,
            (from, event) => {
                return Err(InvalidTransition {
                    from: from.clone(),
                    event,
                });
            }
        };

        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn landed(label: &str) -> AssignmentEvent {
        AssignmentEvent::SpinLanded {
            label: label.into(),
        }
    }

    fn confirm(label: &str) -> AssignmentEvent {
        AssignmentEvent::Confirm {
            label: label.into(),
        }
    }

    #[test]
    fn initial_phase_is_registered() {
        let machine = AssignmentMachine::new();
        assert_eq!(machine.phase(), &AssignmentPhase::Registered);
        assert!(!machine.is_checked_in());
    }

    #[test]
    fn full_happy_path() {
        let mut machine = AssignmentMachine::new();
        machine.apply(AssignmentEvent::CheckIn).unwrap();
        machine.apply(AssignmentEvent::SpinStarted).unwrap();
        machine.apply(landed("AI in Finance")).unwrap();
        assert_eq!(machine.pending(), Some("AI in Finance"));

        machine.apply(confirm("AI in Finance")).unwrap();
        assert_eq!(machine.assigned(), Some("AI in Finance"));
        assert_eq!(machine.version(), 4);

        machine.apply(AssignmentEvent::Reset).unwrap();
        assert_eq!(machine.phase(), &AssignmentPhase::CheckedIn);
    }

    #[test]
    fn spin_requires_check_in() {
        let mut machine = AssignmentMachine::new();
        let err = machine.apply(AssignmentEvent::SpinStarted).unwrap_err();
        assert_eq!(err.from, AssignmentPhase::Registered);
        assert_eq!(err.event, AssignmentEvent::SpinStarted);
    }

    #[test]
    fn assigned_team_cannot_spin_until_reset() {
        let mut machine = AssignmentMachine::restore(true, Some("AI in Healthcare"));
        assert!(machine.apply(AssignmentEvent::SpinStarted).is_err());
        machine.apply(AssignmentEvent::Reset).unwrap();
        assert!(machine.apply(AssignmentEvent::SpinStarted).is_ok());
    }

    #[test]
    fn confirm_must_match_pending_label() {
        let mut machine = AssignmentMachine::restore(true, None);
        machine.apply(AssignmentEvent::SpinStarted).unwrap();
        machine.apply(landed("AI in Education")).unwrap();

        assert!(machine.apply(confirm("AI in Finance")).is_err());
        assert_eq!(machine.pending(), Some("AI in Education"));
    }

    #[test]
    fn pending_result_can_be_discarded_or_respun() {
        let mut machine = AssignmentMachine::restore(true, None);
        machine.apply(AssignmentEvent::SpinStarted).unwrap();
        machine.apply(landed("AI in Education")).unwrap();
        machine.apply(AssignmentEvent::SpinStarted).unwrap();
        assert_eq!(machine.phase(), &AssignmentPhase::Spinning);

        machine.apply(landed("AI in Agriculture")).unwrap();
        machine.apply(AssignmentEvent::Discard).unwrap();
        assert_eq!(machine.phase(), &AssignmentPhase::CheckedIn);
    }

    #[test]
    fn double_check_in_is_rejected() {
        let mut machine = AssignmentMachine::new();
        machine.apply(AssignmentEvent::CheckIn).unwrap();
        assert!(machine.apply(AssignmentEvent::CheckIn).is_err());
        assert_eq!(machine.version(), 1);
    }

    #[test]
    fn restore_treats_empty_domain_as_unassigned() {
        assert_eq!(
            AssignmentMachine::restore(true, Some("")).phase(),
            &AssignmentPhase::CheckedIn
        );
        assert_eq!(
            AssignmentMachine::restore(false, None).phase(),
            &AssignmentPhase::Registered
        );
    }

    #[test]
    fn absorb_only_moves_registered_teams_forward() {
        let mut registered = AssignmentMachine::new();
        registered.absorb(true, None);
        assert_eq!(registered.phase(), &AssignmentPhase::CheckedIn);

        let mut checked_in = AssignmentMachine::restore(true, None);
        checked_in.absorb(false, None);
        assert_eq!(checked_in.phase(), &AssignmentPhase::CheckedIn);

        let mut reset = AssignmentMachine::restore(true, Some("AI in Finance"));
        reset.apply(AssignmentEvent::Reset).unwrap();
        reset.absorb(true, Some("AI in Finance"));
        assert_eq!(reset.assigned(), None);
    }

    #[test]
    fn aborted_spin_returns_to_checked_in() {
        let mut machine = AssignmentMachine::restore(true, None);
        machine.apply(AssignmentEvent::SpinStarted).unwrap();
        machine.apply(AssignmentEvent::SpinAborted).unwrap();
        assert!(machine.can_apply(AssignmentEvent::SpinStarted).is_ok());
    }
}
