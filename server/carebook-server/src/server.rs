use anyhow::{Context, Result};
use auth_identity::{
    IdentityConfig, IdentityService, InMemoryUserRepository, PgUserRepository, UserRepository,
};
use chrono::{DateTime, Utc};
use config_engine::{ServiceConfig, StorageBackend};
use database_layer::{DatabasePool, InMemorySequenceAllocator, SequenceAllocator};
use leave_service::{InMemoryLeaveStore, LeaveService, LeaveStore, PgLeaveStore};
use ledger_service::{InMemoryLedgerStore, LedgerService, LedgerStore, PgLedgerStore};
use patient_service::{InMemoryPatientStore, PatientService, PatientStore, PgPatientStore};
use scheduling_service::{
    AppointmentStore, InMemoryAppointmentStore, PgAppointmentStore, SchedulingService,
};
use std::sync::Arc;
use tracing::info;

/// Which route groups a process serves. The hospital, leave and ledger
/// groups can run as separate processes against the same database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Unit {
    #[default]
    All,
    Hospital,
    Leave,
    Ledger,
}

impl Unit {
    pub fn serves_hospital(self) -> bool {
        matches!(self, Unit::All | Unit::Hospital)
    }

    pub fn serves_leave(self) -> bool {
        matches!(self, Unit::All | Unit::Leave)
    }

    pub fn serves_ledger(self) -> bool {
        matches!(self, Unit::All | Unit::Ledger)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Unit::All => "all",
            Unit::Hospital => "hospital",
            Unit::Leave => "leave",
            Unit::Ledger => "ledger",
        }
    }
}

/// Shared state handed to every handler
#[derive(Clone)]
pub struct CarebookServer {
    pub config: Arc<ServiceConfig>,
    pub identity: IdentityService,
    pub patients: PatientService,
    pub scheduling: SchedulingService,
    pub leaves: LeaveService,
    pub ledger: LedgerService,
    /// Present for the postgres backend only
    pub db: Option<DatabasePool>,
    pub unit: Unit,
    /// Write internal error details into 5xx bodies; off in production
    pub expose_error_details: bool,
    pub started_at: DateTime<Utc>,
}

struct Stores {
    users: Arc<dyn UserRepository>,
    patients: Arc<dyn PatientStore>,
    appointments: Arc<dyn AppointmentStore>,
    leaves: Arc<dyn LeaveStore>,
    ledger: Arc<dyn LedgerStore>,
}

impl Stores {
    fn in_memory() -> Self {
        let sequences: Arc<dyn SequenceAllocator> = Arc::new(InMemorySequenceAllocator::new());
        Self {
            users: Arc::new(InMemoryUserRepository::new()),
            patients: Arc::new(InMemoryPatientStore::new(Arc::clone(&sequences))),
            appointments: Arc::new(InMemoryAppointmentStore::new(sequences)),
            leaves: Arc::new(InMemoryLeaveStore::new()),
            ledger: Arc::new(InMemoryLedgerStore::new()),
        }
    }

    fn postgres(db: &DatabasePool) -> Self {
        Self {
            users: Arc::new(PgUserRepository::new(db.clone())),
            patients: Arc::new(PgPatientStore::new(db.clone())),
            appointments: Arc::new(PgAppointmentStore::new(db.clone())),
            leaves: Arc::new(PgLeaveStore::new(db.clone())),
            ledger: Arc::new(PgLedgerStore::new(db.clone())),
        }
    }
}

impl CarebookServer {
    /// Build the server for the configured storage backend, connecting and
    /// migrating the database when it is postgres
    pub async fn new(config: ServiceConfig, unit: Unit) -> Result<Self> {
        match config.storage.backend {
            StorageBackend::Memory => {
                info!("Using in-memory storage; data is lost on shutdown");
                Self::assemble(config, unit, Stores::in_memory(), None)
            }
            StorageBackend::Postgres => {
                let db = DatabasePool::connect(&config.database)
                    .await
                    .context("Failed to connect to the database")?;
                if config.database.run_migrations {
                    db.migrate().await.context("Failed to run database migrations")?;
                    info!("Database migrations applied");
                }
                let stores = Stores::postgres(&db);
                Self::assemble(config, unit, stores, Some(db))
            }
        }
    }

    /// In-memory server serving every unit; used by tests
    pub fn in_memory(config: ServiceConfig) -> Result<Self> {
        Self::assemble(config, Unit::All, Stores::in_memory(), None)
    }

    fn assemble(
        config: ServiceConfig,
        unit: Unit,
        stores: Stores,
        db: Option<DatabasePool>,
    ) -> Result<Self> {
        let identity = IdentityService::new(
            Arc::clone(&stores.users),
            IdentityConfig::from(&config.auth),
        )
        .context("Failed to initialise identity service")?;

        Ok(Self {
            identity,
            patients: PatientService::new(Arc::clone(&stores.patients)),
            scheduling: SchedulingService::new(
                stores.appointments,
                stores.patients,
                Arc::clone(&stores.users),
            ),
            leaves: LeaveService::new(stores.leaves, stores.users),
            ledger: LedgerService::new(stores.ledger),
            expose_error_details: !config.environment.is_production(),
            config: Arc::new(config),
            db,
            unit,
            started_at: Utc::now(),
        })
    }

    /// Whether the storage backend answers
    pub async fn storage_healthy(&self) -> bool {
        match &self.db {
            Some(db) => db.is_healthy().await,
            None => true,
        }
    }
}
