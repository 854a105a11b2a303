pub mod ledger_audit;
