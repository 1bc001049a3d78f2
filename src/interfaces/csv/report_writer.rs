use crate::domain::transaction::{Transaction, TransactionId, TransactionType};
use crate::domain::user::UserId;
use crate::domain::wallet::Wallet;
use crate::error::Result;
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct WalletRow {
    user: UserId,
    balance_local: String,
    balance_z: String,
}

#[derive(Serialize)]
struct TransactionRow<'a> {
    id: TransactionId,
    user: UserId,
    r#type: TransactionType,
    amount_local: String,
    amount_z: String,
    description: &'a str,
}

fn money(amount: Option<Decimal>) -> String {
    amount.map(|a| format!("{a:.2}")).unwrap_or_default()
}

/// Writes the final wallet state or the ledger history as CSV.
pub struct ReportWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> ReportWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    /// One row per wallet, ordered by user id.
    pub fn write_wallets(&mut self, mut wallets: Vec<Wallet>) -> Result<()> {
        wallets.sort_by_key(|w| w.user);
        for wallet in wallets {
            self.writer.serialize(WalletRow {
                user: wallet.user,
                balance_local: wallet.balance_local.to_string(),
                balance_z: wallet.balance_z.to_string(),
            })?;
        }
        self.writer.flush()?;
        Ok(())
    }

    /// One row per ledger entry, in id order.
    pub fn write_transactions(&mut self, mut transactions: Vec<Transaction>) -> Result<()> {
        transactions.sort_by_key(|t| t.id);
        for tx in &transactions {
            self.writer.serialize(TransactionRow {
                id: tx.id,
                user: tx.user,
                r#type: tx.r#type,
                amount_local: money(tx.amount_local),
                amount_z: money(tx.amount_z),
                description: &tx.description,
            })?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    #[test]
    fn test_wallets_sorted_and_padded() {
        let mut out = Vec::new();
        let mut second = Wallet::new(2);
        second.apply(None, Some(dec!(18))).unwrap();
        let mut first = Wallet::new(1);
        first.apply(Some(dec!(1234.5)), None).unwrap();

        ReportWriter::new(&mut out)
            .write_wallets(vec![second, first])
            .unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "user,balance_local,balance_z\n1,1234.50,0.00\n2,0.00,18.00\n"
        );
    }

    #[test]
    fn test_transaction_rows_leave_untouched_currency_empty() {
        let mut out = Vec::new();
        let tx = Transaction {
            id: 7,
            user: 1,
            r#type: TransactionType::Deposit,
            amount_local: Some(dec!(500)),
            amount_z: None,
            description: "Manual deposit (simulation)".to_string(),
            created_at: Utc::now(),
        };

        ReportWriter::new(&mut out)
            .write_transactions(vec![tx])
            .unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("id,user,type,amount_local,amount_z,description\n"));
        assert!(text.contains("7,1,deposit,500.00,,Manual deposit (simulation)"));
    }
}
