//! Local BOLT-11 decoding.

use std::str::FromStr;

use lightning_invoice::{Bolt11Invoice, Bolt11InvoiceDescription};
use lnaddr::{FundingError, InvoiceDetails};

/// Decodes and signature-checks a BOLT-11 invoice.
///
/// A `lightning:` URI prefix is accepted.
///
/// # Errors
///
/// Returns [`FundingError::MalformedInvoice`] if the string is not a valid
/// invoice.
pub fn decode_bolt11(invoice: &str) -> Result<InvoiceDetails, FundingError> {
    let invoice = invoice.trim();
    let invoice = invoice
        .strip_prefix("lightning:")
        .or_else(|| invoice.strip_prefix("LIGHTNING:"))
        .unwrap_or(invoice);
    let parsed = Bolt11Invoice::from_str(invoice)
        .map_err(|e| FundingError::MalformedInvoice(e.to_string()))?;

    let description = match parsed.description() {
        Bolt11InvoiceDescription::Direct(description) => description.to_string(),
        Bolt11InvoiceDescription::Hash(hash) => hash.0.to_string(),
    };

    Ok(InvoiceDetails {
        amount_msat: parsed.amount_milli_satoshis(),
        payment_hash: parsed.payment_hash().to_string(),
        description: Some(description),
        payee: Some(parsed.get_payee_pub_key().to_string()),
        timestamp: parsed.duration_since_epoch().as_secs(),
        expiry_secs: parsed.expiry_time().as_secs(),
    })
}
