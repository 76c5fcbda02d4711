//! Property-based tests for ledger invariants.
