use super::conversion::Converter;
use super::ledger::require_user;
use crate::config::{Config, LedgerConfig};
use crate::domain::catalog::{CoursePart, Enrollment, PartId};
use crate::domain::money::Amount;
use crate::domain::ports::LedgerStoreBox;
use crate::domain::settings::SitePaymentSettings;
use crate::domain::user::{Role, User, UserId};
use crate::error::{Result, WalletError};
use chrono::Utc;

/// The main entry point for wallet and commerce operations.
///
/// `WalletEngine` owns the storage backend and the ledger constants. Each
/// public operation opens one unit of work, so it either commits completely
/// or leaves no trace.
pub struct WalletEngine {
    pub(crate) store: LedgerStoreBox,
    pub(crate) converter: Converter,
    pub(crate) config: LedgerConfig,
    pub(crate) site_defaults: SitePaymentSettings,
}

impl WalletEngine {
    /// Creates a new `WalletEngine` instance.
    ///
    /// # Arguments
    ///
    /// * `store` - The ledger storage backend.
    /// * `config` - Ledger constants and the site settings seed.
    pub fn new(store: LedgerStoreBox, config: &Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store,
            converter: Converter::new(config.ledger.exchange_rate)?,
            config: config.ledger.clone(),
            site_defaults: config.site.clone(),
        })
    }

    pub fn converter(&self) -> &Converter {
        &self.converter
    }

    pub fn ledger_config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Inserts or updates a directory account.
    ///
    /// Updating keeps the stored XP and teacher enrollment; those only change
    /// through purchases and [`WalletEngine::enroll_teacher`].
    pub async fn register_user(&self, mut user: User) -> Result<()> {
        let mut unit = self.store.begin().await?;
        if let Some(existing) = unit.user(user.id).await? {
            user.xp = existing.xp;
            user.teacher_enrolled = existing.teacher_enrolled;
        }
        tracing::debug!(user = user.id, role = %user.role, "user registered");
        unit.put_user(user).await?;
        unit.commit().await
    }

    pub async fn user(&self, id: UserId) -> Result<User> {
        let mut unit = self.store.begin().await?;
        require_user(unit.as_mut(), id).await
    }

    /// Lists a course part for sale. The owner must be a teacher who has paid
    /// the enrollment fee, and the price a positive 2dp amount.
    pub async fn publish_part(&self, part: CoursePart) -> Result<()> {
        Amount::new(part.price_z)?;
        let mut unit = self.store.begin().await?;
        let owner = require_user(unit.as_mut(), part.teacher).await?;
        match owner.role {
            Role::Teacher if owner.teacher_enrolled => {}
            Role::Teacher => {
                return Err(WalletError::RoleForbidden {
                    role: Role::Teacher,
                    action: "publish course parts before paying the enrollment fee",
                });
            }
            role @ (Role::Student | Role::Ceo) => {
                return Err(WalletError::RoleForbidden {
                    role,
                    action: "publish course parts",
                });
            }
        }
        tracing::debug!(part = part.id, teacher = part.teacher, price_z = %part.price_z, "course part published");
        unit.put_course_part(part).await?;
        unit.commit().await
    }

    pub async fn course_part(&self, id: PartId) -> Result<CoursePart> {
        let mut unit = self.store.begin().await?;
        unit.course_part(id)
            .await?
            .ok_or_else(|| WalletError::NotFound(format!("Course part {id}")))
    }

    pub async fn enrollment(&self, student: UserId, part: PartId) -> Result<Option<Enrollment>> {
        let mut unit = self.store.begin().await?;
        unit.enrollment(student, part).await
    }

    /// The current site payment settings, falling back to the configured
    /// seed until an admin saves a record.
    pub async fn site_settings(&self) -> Result<SitePaymentSettings> {
        let mut unit = self.store.begin().await?;
        Ok(unit
            .site_settings()
            .await?
            .unwrap_or_else(|| self.site_defaults.clone()))
    }

    /// Saves the site payment settings record.
    pub async fn update_site_settings(
        &self,
        mut settings: SitePaymentSettings,
    ) -> Result<SitePaymentSettings> {
        settings.updated_at = Some(Utc::now());
        let mut unit = self.store.begin().await?;
        unit.put_site_settings(settings.clone()).await?;
        unit.commit().await?;
        tracing::info!(
            teacher_enrollment_fee_z = settings.teacher_enrollment_fee_z,
            "site payment settings updated"
        );
        Ok(settings)
    }
}
