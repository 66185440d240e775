//! Paths and defaults of the HTTP integrations.

use std::time::Duration;

/// Path of the NWC proxy command endpoint, relative to its base URL.
pub const RUN_COMMAND_PATH: &str = "api/run-command";

/// Proxy action creating an invoice.
pub const MAKE_INVOICE_ACTION: &str = "makeInvoice";

/// Proxy action reading the wallet balance.
pub const GET_BALANCE_ACTION: &str = "getBalance";

/// Proxy action paying an invoice.
pub const SEND_PAYMENT_ACTION: &str = "sendPayment";

/// Memo attached to invoices created for deposits.
pub const DEFAULT_INVOICE_MEMO: &str = "Deposit";

/// Default per-request timeout.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);
