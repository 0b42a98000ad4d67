//! Transition function of the kiosk state machine
//!
//! [`decide`] maps the scan context and the facts resolved for a scan to a
//! [`Decision`]. It performs no I/O: the machine gathers the facts from the
//! ledger beforehand and carries out lends, returns and visit logging
//! afterwards, feeding ledger results back through [`settle_lend`] and
//! [`settle_return`].

use crate::{
    error::AppResult,
    models::{CatalogItem, ItemStatus, Loan, Member},
};

use super::state::{Outcome, OutcomeMessage, PatronSession, ScanContext, TerminalState};

/// Who holds a scanned item according to the ledger
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemHolding {
    Available,
    HeldBy(Loan),
    /// Marked borrowed, but the ledger has no open loan for it
    Inconsistent,
}

impl ItemHolding {
    pub fn from_ledger(item: &CatalogItem, open_loan: Option<Loan>) -> Self {
        match open_loan {
            Some(loan) => ItemHolding::HeldBy(loan),
            None if item.status == ItemStatus::Borrowed => ItemHolding::Inconsistent,
            None => ItemHolding::Available,
        }
    }
}

/// Ledger state fetched for an item scanned in borrow mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemLookup {
    pub holding: ItemHolding,
    /// Fresh open loans of the member in borrow mode
    pub member_loans: Vec<Loan>,
}

/// A classified scan with the ledger facts it needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanFacts {
    Unrecognized,
    Member {
        member: Member,
        active_loans: Vec<Loan>,
    },
    /// `lookup` is only resolved in borrow mode; item scans are rejected elsewhere
    Item {
        item: CatalogItem,
        lookup: Option<ItemLookup>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Move to this state without touching the ledger
    Settle(TerminalState),
    /// Fresh identification: record a visit, then `MemberIdentified`
    Identify(PatronSession),
    Lend {
        session: PatronSession,
        item: CatalogItem,
    },
    Return {
        session: PatronSession,
        item: CatalogItem,
        loan: Loan,
    },
}

fn rejected(message: OutcomeMessage, session: Option<PatronSession>) -> Decision {
    Decision::Settle(TerminalState::Outcome(Outcome::error(message, session)))
}

pub fn decide(context: ScanContext<'_>, facts: ScanFacts) -> Decision {
    match (context, facts) {
        (context, ScanFacts::Unrecognized) => {
            rejected(OutcomeMessage::UnrecognizedCode, context.borrow_session())
        }

        (ScanContext::Neutral, ScanFacts::Member { member, active_loans }) => {
            Decision::Identify(PatronSession::new(member, active_loans))
        }
        (ScanContext::Neutral, ScanFacts::Item { .. }) => {
            rejected(OutcomeMessage::ScanMemberCardFirst, None)
        }

        (ScanContext::Identified(current), ScanFacts::Member { member, active_loans }) => {
            if current.is_member(member.id) {
                Decision::Settle(TerminalState::BorrowMode(PatronSession::new(
                    member,
                    active_loans,
                )))
            } else {
                Decision::Identify(PatronSession::new(member, active_loans))
            }
        }
        (ScanContext::Identified(_), ScanFacts::Item { .. }) => {
            rejected(OutcomeMessage::ScanCardAgain, None)
        }

        (ScanContext::Borrowing(current), ScanFacts::Member { member, active_loans }) => {
            if current.is_member(member.id) {
                Decision::Settle(TerminalState::BorrowMode(PatronSession::new(
                    member,
                    active_loans,
                )))
            } else {
                Decision::Identify(PatronSession::new(member, active_loans))
            }
        }
        (ScanContext::Borrowing(current), ScanFacts::Item { item, lookup }) => {
            let Some(lookup) = lookup else {
                return rejected(OutcomeMessage::SystemError, Some(current.clone()));
            };
            let session = PatronSession::new(current.member.clone(), lookup.member_loans);

            match lookup.holding {
                ItemHolding::HeldBy(loan) if session.is_member(loan.member_id) => {
                    Decision::Return {
                        session,
                        item,
                        loan,
                    }
                }
                ItemHolding::HeldBy(_) => {
                    rejected(OutcomeMessage::HeldByAnotherMember, Some(session))
                }
                ItemHolding::Inconsistent => rejected(OutcomeMessage::SystemError, Some(session)),
                ItemHolding::Available if session.at_borrow_limit() => {
                    rejected(OutcomeMessage::BorrowLimitReached, Some(session))
                }
                ItemHolding::Available => Decision::Lend { session, item },
            }
        }
    }
}

/// State after the ledger answered a lend
pub fn settle_lend(
    mut session: PatronSession,
    item: &CatalogItem,
    result: AppResult<Loan>,
) -> TerminalState {
    let outcome = match result {
        Ok(loan) => {
            session.active_loans.push(loan);
            Outcome::success(OutcomeMessage::Borrowed, item.title.clone(), session)
        }
        // Another terminal opened a loan on the item since the lookup
        Err(e) if e.is_rejection() => {
            Outcome::error(OutcomeMessage::HeldByAnotherMember, Some(session))
        }
        Err(_) => Outcome::error(OutcomeMessage::SystemError, Some(session)),
    };
    TerminalState::Outcome(outcome)
}

/// State after the ledger answered a return
pub fn settle_return(
    mut session: PatronSession,
    item: &CatalogItem,
    result: AppResult<Loan>,
) -> TerminalState {
    let outcome = match result {
        Ok(closed) => {
            session.active_loans.retain(|loan| loan.id != closed.id);
            Outcome::success(OutcomeMessage::Returned, item.title.clone(), session)
        }
        Err(_) => Outcome::error(OutcomeMessage::SystemError, Some(session)),
    };
    TerminalState::Outcome(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::kiosk::state::OutcomeKind;
    use chrono::{TimeZone, Utc};

    fn member(id: i32, max_loans: i16) -> Member {
        Member {
            id,
            card_code: format!("M-{:04}", id),
            display_name: format!("Member {}", id),
            group_label: None,
            max_loans,
        }
    }

    fn item(id: i32, status: ItemStatus) -> CatalogItem {
        CatalogItem {
            id,
            barcode: format!("B-{}", id),
            title: format!("Title {}", id),
            status,
        }
    }

    fn loan(id: i32, member_id: i32, item_id: i32) -> Loan {
        Loan {
            id,
            member_id,
            item_id,
            returned: false,
            borrowed_at: Utc.with_ymd_and_hms(2024, 9, 2, 10, 30, 0).unwrap(),
            returned_at: None,
        }
    }

    fn outcome(decision: Decision) -> Outcome {
        match decision {
            Decision::Settle(TerminalState::Outcome(outcome)) => outcome,
            other => panic!("expected an outcome, got {:?}", other),
        }
    }

    fn borrow_scan(item: CatalogItem, holding: ItemHolding, member_loans: Vec<Loan>) -> ScanFacts {
        ScanFacts::Item {
            item,
            lookup: Some(ItemLookup {
                holding,
                member_loans,
            }),
        }
    }

    #[test]
    fn test_neutral_member_scan_identifies() {
        let facts = ScanFacts::Member {
            member: member(1, 3),
            active_loans: vec![loan(5, 1, 50)],
        };
        match decide(ScanContext::Neutral, facts) {
            Decision::Identify(session) => {
                assert_eq!(session.member.id, 1);
                assert_eq!(session.loan_count(), 1);
            }
            other => panic!("unexpected decision {:?}", other),
        }
    }

    #[test]
    fn test_item_scans_rejected_outside_borrow_mode() {
        let facts = ScanFacts::Item {
            item: item(10, ItemStatus::Available),
            lookup: None,
        };
        let neutral = outcome(decide(ScanContext::Neutral, facts.clone()));
        assert_eq!(neutral.kind, OutcomeKind::Error);
        assert_eq!(neutral.message, OutcomeMessage::ScanMemberCardFirst);
        assert!(neutral.session.is_none());

        let session = PatronSession::new(member(1, 3), vec![]);
        let identified = outcome(decide(ScanContext::Identified(&session), facts));
        assert_eq!(identified.message, OutcomeMessage::ScanCardAgain);
        assert!(identified.session.is_none());
    }

    #[test]
    fn test_second_scan_enters_borrow_mode() {
        let session = PatronSession::new(member(1, 3), vec![]);
        let facts = ScanFacts::Member {
            member: member(1, 3),
            active_loans: vec![loan(8, 1, 80)],
        };
        match decide(ScanContext::Identified(&session), facts) {
            Decision::Settle(TerminalState::BorrowMode(session)) => {
                assert_eq!(session.active_loans, vec![loan(8, 1, 80)]);
            }
            other => panic!("unexpected decision {:?}", other),
        }
    }

    #[test]
    fn test_different_member_reidentifies() {
        let session = PatronSession::new(member(1, 3), vec![]);
        let facts = ScanFacts::Member {
            member: member(2, 3),
            active_loans: vec![],
        };
        for context in [ScanContext::Identified(&session), ScanContext::Borrowing(&session)] {
            match decide(context, facts.clone()) {
                Decision::Identify(next) => assert_eq!(next.member.id, 2),
                other => panic!("unexpected decision {:?}", other),
            }
        }
    }

    #[test]
    fn test_same_member_in_borrow_mode_redisplays() {
        let session = PatronSession::new(member(1, 3), vec![]);
        let facts = ScanFacts::Member {
            member: member(1, 3),
            active_loans: vec![],
        };
        assert_eq!(
            decide(ScanContext::Borrowing(&session), facts),
            Decision::Settle(TerminalState::BorrowMode(session.clone()))
        );
    }

    #[test]
    fn test_unrecognized_keeps_borrow_session_only() {
        let session = PatronSession::new(member(1, 3), vec![]);
        let in_borrow = outcome(decide(ScanContext::Borrowing(&session), ScanFacts::Unrecognized));
        assert_eq!(in_borrow.message, OutcomeMessage::UnrecognizedCode);
        assert_eq!(in_borrow.session, Some(session.clone()));

        let identified = outcome(decide(ScanContext::Identified(&session), ScanFacts::Unrecognized));
        assert_eq!(identified.message, OutcomeMessage::UnrecognizedCode);
        assert!(identified.session.is_none());
    }

    #[test]
    fn test_own_item_is_returned() {
        let session = PatronSession::new(member(1, 3), vec![]);
        let held = loan(4, 1, 10);
        let facts = borrow_scan(
            item(10, ItemStatus::Borrowed),
            ItemHolding::HeldBy(held.clone()),
            vec![held.clone()],
        );
        match decide(ScanContext::Borrowing(&session), facts) {
            Decision::Return { loan, session, .. } => {
                assert_eq!(loan, held);
                assert_eq!(session.loan_count(), 1);
            }
            other => panic!("unexpected decision {:?}", other),
        }
    }

    #[test]
    fn test_item_held_by_another_member() {
        let session = PatronSession::new(member(1, 3), vec![]);
        let facts = borrow_scan(
            item(10, ItemStatus::Borrowed),
            ItemHolding::HeldBy(loan(4, 2, 10)),
            vec![],
        );
        let result = outcome(decide(ScanContext::Borrowing(&session), facts));
        assert_eq!(result.message, OutcomeMessage::HeldByAnotherMember);
        assert!(result.session.is_some());
    }

    #[test]
    fn test_borrow_limit_uses_fresh_loans() {
        // Session was built with no loans, the ledger now reports one
        let session = PatronSession::new(member(2, 1), vec![]);
        let facts = borrow_scan(
            item(30, ItemStatus::Available),
            ItemHolding::Available,
            vec![loan(1, 2, 20)],
        );
        let result = outcome(decide(ScanContext::Borrowing(&session), facts));
        assert_eq!(result.message, OutcomeMessage::BorrowLimitReached);
        assert_eq!(result.session.map(|s| s.loan_count()), Some(1));
    }

    #[test]
    fn test_available_item_is_lent() {
        let session = PatronSession::new(member(1, 3), vec![]);
        let facts = borrow_scan(item(10, ItemStatus::Available), ItemHolding::Available, vec![]);
        assert!(matches!(
            decide(ScanContext::Borrowing(&session), facts),
            Decision::Lend { .. }
        ));
    }

    #[test]
    fn test_inconsistent_item_is_system_error() {
        let holding = ItemHolding::from_ledger(&item(10, ItemStatus::Borrowed), None);
        assert_eq!(holding, ItemHolding::Inconsistent);

        let session = PatronSession::new(member(1, 3), vec![]);
        let facts = borrow_scan(item(10, ItemStatus::Borrowed), holding, vec![]);
        let result = outcome(decide(ScanContext::Borrowing(&session), facts));
        assert_eq!(result.message, OutcomeMessage::SystemError);
    }

    #[test]
    fn test_open_loan_wins_over_catalog_status() {
        let holding = ItemHolding::from_ledger(&item(10, ItemStatus::Available), Some(loan(1, 2, 10)));
        assert_eq!(holding, ItemHolding::HeldBy(loan(1, 2, 10)));
    }

    #[test]
    fn test_settle_lend() {
        let session = PatronSession::new(member(1, 3), vec![]);
        let book = item(10, ItemStatus::Available);

        match settle_lend(session.clone(), &book, Ok(loan(9, 1, 10))) {
            TerminalState::Outcome(outcome) => {
                assert_eq!(outcome.kind, OutcomeKind::Success);
                assert_eq!(outcome.message, OutcomeMessage::Borrowed);
                assert_eq!(outcome.detail.as_deref(), Some("Title 10"));
                assert_eq!(outcome.session.map(|s| s.loan_count()), Some(1));
            }
            other => panic!("unexpected state {:?}", other),
        }

        let raced = settle_lend(
            session.clone(),
            &book,
            Err(AppError::Conflict("Item is already borrowed".into())),
        );
        assert!(matches!(
            raced,
            TerminalState::Outcome(Outcome { message: OutcomeMessage::HeldByAnotherMember, .. })
        ));

        let failed = settle_lend(session, &book, Err(AppError::Database(sqlx::Error::PoolTimedOut)));
        assert!(matches!(
            failed,
            TerminalState::Outcome(Outcome { message: OutcomeMessage::SystemError, .. })
        ));
    }

    #[test]
    fn test_settle_return() {
        let held = loan(4, 1, 10);
        let session = PatronSession::new(member(1, 3), vec![held.clone(), loan(5, 1, 11)]);
        let book = item(10, ItemStatus::Borrowed);

        let mut closed = held;
        closed.returned = true;
        closed.returned_at = Some(Utc::now());

        match settle_return(session.clone(), &book, Ok(closed)) {
            TerminalState::Outcome(outcome) => {
                assert_eq!(outcome.message, OutcomeMessage::Returned);
                let remaining = outcome.session.unwrap().active_loans;
                assert_eq!(remaining.len(), 1);
                assert_eq!(remaining[0].id, 5);
            }
            other => panic!("unexpected state {:?}", other),
        }

        let failed = settle_return(
            session,
            &book,
            Err(AppError::BusinessRule("Loan already returned".into())),
        );
        assert!(matches!(
            failed,
            TerminalState::Outcome(Outcome { message: OutcomeMessage::SystemError, .. })
        ));
    }
}
