pub mod ledger_controller;
