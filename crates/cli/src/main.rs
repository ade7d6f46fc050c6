mod render;

use anyhow::{anyhow, Context};
use clap::{Args, Parser, Subcommand};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use ward_core::{
    base_url_from_env_value, constants::API_URL_ENV, patient_draft, test_draft, ClientConfig,
    DetailController, HttpGateway, ListController, ListScope, LoadPhase, Notice, PatientInput,
    RecordId, RecordRepository,
};

#[derive(Parser)]
#[command(name = "ward")]
#[command(about = "Hospital patient and test records CLI")]
struct Cli {
    /// Base URL of the record API (overrides WARD_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List patients
    List {
        /// Show only patients whose name contains this text
        #[arg(long)]
        filter: Option<String>,
        /// Show only patients in critical condition
        #[arg(long)]
        critical: bool,
    },
    /// Show a patient with their tests
    Show {
        /// Patient ID
        id: String,
    },
    /// Show a patient's medical history
    History {
        /// Patient ID
        id: String,
    },
    /// Create a patient
    CreatePatient(PatientArgs),
    /// Update a patient
    UpdatePatient {
        /// Patient ID
        id: String,
        #[command(flatten)]
        patient: PatientArgs,
    },
    /// Delete a patient and all their tests
    DeletePatient {
        /// Patient ID
        id: String,
    },
    /// Show a single test
    ShowTest {
        /// Patient ID
        patient: String,
        /// Test ID
        test: String,
    },
    /// Record a test for a patient
    AddTest {
        /// Patient ID
        patient: String,
        /// Test type, e.g. "Blood Pressure"
        kind: String,
        /// Reading, e.g. "120/80"
        value: String,
    },
    /// Change a test's type and value
    UpdateTest {
        /// Patient ID
        patient: String,
        /// Test ID
        test: String,
        /// Test type
        kind: String,
        /// Reading
        value: String,
    },
    /// Delete a test
    DeleteTest {
        /// Patient ID
        patient: String,
        /// Test ID
        test: String,
    },
}

#[derive(Args)]
struct PatientArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    age: i64,
    /// male, female or other
    #[arg(long)]
    gender: String,
    #[arg(long)]
    address: Option<String>,
    #[arg(long)]
    phone: Option<String>,
    /// Medical history entry (repeatable)
    #[arg(long = "history")]
    history: Vec<String>,
}

impl From<PatientArgs> for PatientInput {
    fn from(args: PatientArgs) -> Self {
        PatientInput {
            name: args.name,
            age: args.age,
            gender: args.gender,
            address: args.address,
            phone_number: args.phone,
            medical_history: args.history,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("ward_core=warn".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("Use 'ward --help' for commands");
        return Ok(());
    };

    let base_url =
        base_url_from_env_value(cli.api_url.or_else(|| std::env::var(API_URL_ENV).ok()));
    let cfg = ClientConfig::with_base_url(&base_url).context("invalid API URL")?;
    let gateway = HttpGateway::new(Arc::new(cfg))?;
    let repository = Arc::new(RecordRepository::new(Arc::new(gateway)));

    match command {
        Commands::List { filter, critical } => {
            let scope = if critical {
                ListScope::Critical
            } else {
                ListScope::All
            };
            let list = ListController::new(repository, scope);
            let mut view = list.refresh().await;
            if view.phase == LoadPhase::Failed {
                return Err(failure(view.notice));
            }
            if let Some(query) = filter {
                view = list.set_filter(&query);
            }
            print!("{}", render::list(&view));
        }
        Commands::Show { id } => {
            let detail = DetailController::new(repository, parse_id(&id)?);
            let view = detail.enter().await;
            if view.patient.value().is_none() {
                return Err(failure(view.patient.error.map(|e| e.notice())));
            }
            print!("{}", render::detail(&view));
            if let Some(err) = &view.tests.error {
                eprintln!("{}", render::notice(&err.notice()));
            }
        }
        Commands::History { id } => {
            let detail = DetailController::new(repository, parse_id(&id)?);
            match detail.history().await {
                Some(history) => print!("{}", render::history(&history)),
                None => return Err(failure(detail.view().notice)),
            }
        }
        Commands::CreatePatient(args) => {
            let draft = patient_draft(args.into())?;
            let list = ListController::new(repository, ListScope::All);
            match list.create(&draft).await {
                Some(patient) => println!("Created patient {}", render::patient_line(&patient)),
                None => return Err(failure(list.view().notice)),
            }
        }
        Commands::UpdatePatient { id, patient } => {
            let draft = patient_draft(patient.into())?;
            let detail = DetailController::new(repository, parse_id(&id)?);
            if detail.update_patient(&draft).await.is_none() {
                return Err(failure(detail.view().notice));
            }
            print!("{}", render::detail(&detail.view()));
        }
        Commands::DeletePatient { id } => {
            let detail = DetailController::new(repository, parse_id(&id)?);
            if !detail.delete_patient().await {
                return Err(failure(detail.view().notice));
            }
            println!("Deleted patient {id}");
        }
        Commands::ShowTest { patient, test } => {
            let detail = DetailController::new(repository, parse_id(&patient)?);
            match detail.fetch_test(&parse_id(&test)?).await {
                Some(test) => println!("{}", render::test_line(&test)),
                None => return Err(failure(detail.view().notice)),
            }
        }
        Commands::AddTest {
            patient,
            kind,
            value,
        } => {
            let draft = test_draft(&kind, &value)?;
            let detail = DetailController::new(repository, parse_id(&patient)?);
            match detail.create_test(&draft).await {
                Some(test) => {
                    println!("Recorded test {}", test.id);
                    print!("{}", render::detail(&detail.view()));
                }
                None => return Err(failure(detail.view().notice)),
            }
        }
        Commands::UpdateTest {
            patient,
            test,
            kind,
            value,
        } => {
            let draft = test_draft(&kind, &value)?;
            let detail = DetailController::new(repository, parse_id(&patient)?);
            if detail.update_test(&parse_id(&test)?, &draft).await.is_none() {
                return Err(failure(detail.view().notice));
            }
            print!("{}", render::detail(&detail.view()));
        }
        Commands::DeleteTest { patient, test } => {
            let detail = DetailController::new(repository, parse_id(&patient)?);
            if !detail.delete_test(&parse_id(&test)?).await {
                return Err(failure(detail.view().notice));
            }
            print!("{}", render::detail(&detail.view()));
        }
    }

    Ok(())
}

fn parse_id(raw: &str) -> anyhow::Result<RecordId> {
    RecordId::parse(raw).with_context(|| format!("invalid record id '{raw}'"))
}

fn failure(notice: Option<Notice>) -> anyhow::Error {
    match notice {
        Some(notice) => anyhow!(render::notice(&notice)),
        None => anyhow!("request failed"),
    }
}
