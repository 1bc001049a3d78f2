use crate::application::engine::WalletEngine;
use crate::domain::catalog::CoursePart;
use crate::domain::payment_order::Provider;
use crate::domain::user::{Role, User, UserId};
use crate::error::{Result, WalletError};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// Register a directory account; `detail` is the role.
    Signup,
    /// List a course part; `user` is the teacher, `target` the part id,
    /// `amount` the Z price, `detail` an optional name.
    Publish,
    Deposit,
    /// Demo gateway top-up; `detail` is the provider (default card).
    Topup,
    /// Manual card transfer request; `detail` is the transfer reference.
    Request,
    Approve,
    Fail,
    Cancel,
    Convert,
    Purchase,
    Enroll,
    Withdraw,
}

/// One row of a command file: `op, user, target, amount, detail`.
#[derive(Debug, Deserialize, PartialEq, Eq, Clone)]
pub struct Command {
    pub op: Operation,
    pub user: Option<UserId>,
    pub target: Option<u64>,
    pub amount: Option<Decimal>,
    pub detail: Option<String>,
}

impl Command {
    fn user(&self) -> Result<UserId> {
        self.user
            .ok_or_else(|| WalletError::InvalidCommand(format!("{:?} needs a user", self.op)))
    }

    fn target(&self) -> Result<u64> {
        self.target
            .ok_or_else(|| WalletError::InvalidCommand(format!("{:?} needs a target", self.op)))
    }

    fn amount(&self) -> Result<Decimal> {
        self.amount
            .ok_or_else(|| WalletError::InvalidCommand(format!("{:?} needs an amount", self.op)))
    }

    fn part_id(&self) -> Result<u32> {
        let target = self.target()?;
        u32::try_from(target)
            .map_err(|_| WalletError::InvalidCommand(format!("part id {target} out of range")))
    }

    /// Executes the command against the engine.
    pub async fn apply(&self, engine: &WalletEngine) -> Result<()> {
        match self.op {
            Operation::Signup => {
                let id = self.user()?;
                let role: Role = self
                    .detail
                    .as_deref()
                    .unwrap_or("student")
                    .parse()
                    .map_err(WalletError::InvalidCommand)?;
                engine
                    .register_user(User::new(id, format!("user{id}"), role))
                    .await?;
                engine.get_or_create_wallet(id).await?;
            }
            Operation::Publish => {
                let id = self.part_id()?;
                engine
                    .publish_part(CoursePart {
                        id,
                        teacher: self.user()?,
                        name: self.detail.clone().unwrap_or_else(|| format!("Part {id}")),
                        price_z: self.amount()?,
                    })
                    .await?;
            }
            Operation::Deposit => {
                engine.deposit_local(self.user()?, self.amount()?).await?;
            }
            Operation::Topup => {
                let provider: Provider = self
                    .detail
                    .as_deref()
                    .unwrap_or("card")
                    .parse()
                    .map_err(WalletError::InvalidCommand)?;
                engine
                    .demo_top_up(self.user()?, provider, self.amount()?)
                    .await?;
            }
            Operation::Request => {
                engine
                    .request_card_top_up(self.user()?, self.amount()?, self.detail.as_deref())
                    .await?;
            }
            Operation::Approve => {
                engine.mark_paid(self.target()?).await?;
            }
            Operation::Fail => {
                engine.mark_failed(self.target()?).await?;
            }
            Operation::Cancel => {
                engine.cancel_order(self.target()?).await?;
            }
            Operation::Convert => {
                engine
                    .convert_local_to_z(self.user()?, self.amount()?)
                    .await?;
            }
            Operation::Purchase => {
                engine
                    .purchase_course_part(self.user()?, self.part_id()?)
                    .await?;
            }
            Operation::Enroll => {
                engine.enroll_teacher(self.user()?).await?;
            }
            Operation::Withdraw => {
                engine
                    .withdraw_z_to_local(self.user()?, self.amount()?)
                    .await?;
            }
        }
        Ok(())
    }
}

/// Reads commands from a CSV source.
///
/// This reader wraps `csv::Reader` and provides an iterator over `Result<Command>`.
/// It handles whitespace trimming and flexible record lengths automatically.
pub struct CommandReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> CommandReader<R> {
    /// Creates a new `CommandReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Returns an iterator that lazily reads and deserializes commands.
    pub fn commands(self) -> impl Iterator<Item = Result<Command>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(WalletError::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_reader_valid_stream() {
        let data = "op, user, target, amount, detail\n\
                    signup, 1, , , student\n\
                    publish, 2, 10, 20, Algebra\n\
                    purchase, 1, 10, ,";
        let reader = CommandReader::new(data.as_bytes());
        let results: Vec<Result<Command>> = reader.commands().collect();

        assert_eq!(results.len(), 3);
        let signup = results[0].as_ref().unwrap();
        assert_eq!(signup.op, Operation::Signup);
        assert_eq!(signup.target, None);
        assert_eq!(signup.detail.as_deref(), Some("student"));

        let publish = results[1].as_ref().unwrap();
        assert_eq!(publish.amount, Some(dec!(20)));

        let purchase = results[2].as_ref().unwrap();
        assert_eq!(purchase.target, Some(10));
        assert_eq!(purchase.detail, None);
    }

    #[test]
    fn test_reader_malformed_line() {
        let data = "op, user, target, amount, detail\nrefund, 1, , 1.0,";
        let reader = CommandReader::new(data.as_bytes());
        let results: Vec<Result<Command>> = reader.commands().collect();

        assert!(results[0].is_err());
    }

    #[test]
    fn test_missing_field_reported() {
        let command = Command {
            op: Operation::Deposit,
            user: Some(1),
            target: None,
            amount: None,
            detail: None,
        };
        assert!(matches!(command.amount(), Err(WalletError::InvalidCommand(_))));
    }
}
