use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use engine::DrawMode;
use rust_decimal::Decimal;
use serde::Serialize;
use storage::Database;
use storage::dto::{
    AnnulCaptureRequest, BanCompetitorRequest, CaptureFilter, CaptureStatus, CompetitorFilter,
    ConfirmPaymentRequest, CreateCaptureRequest, CreateCompetitorRequest, CreateEditionRequest,
    CreateRegistrationRequest, CreateStageRequest, EliminateRequest, GenerateRulersRequest,
    RankingFilter, RegistrationFilter, RulerFilter, StageFilter, UpdateCompetitorRequest,
    ValidateCaptureRequest,
};
use storage::models::{PaymentStatus, RankingCategory, Species, StageStatus};
use storage::services::{captures, competitors, editions, ranking, registrations, rulers, stages};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "copa-admin")]
#[command(about = "Fishing tournament administration", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    CreateEdition {
        #[arg(long)]
        year: i32,
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
        /// Create without making it the active edition
        #[arg(long)]
        inactive: bool,
    },
    /// Make an edition the active one, deactivating the previous
    ActivateEdition {
        edition: Uuid,
    },
    ListEditions,
    /// Print the active edition with its stages
    ActiveEdition,
    CreateStage {
        #[arg(long)]
        edition: Option<Uuid>,
        #[arg(long)]
        name: String,
        #[arg(long)]
        location: String,
        /// RFC 3339 start time, e.g. 2026-09-12T06:00:00Z
        #[arg(long)]
        starts_at: DateTime<Utc>,
        #[arg(long, default_value = "0")]
        entry_fee: Decimal,
        /// 0 means unlimited
        #[arg(long, default_value_t = 0)]
        capacity: i32,
    },
    ListStages {
        #[arg(long)]
        edition: Option<Uuid>,
        #[arg(long)]
        status: Option<StageStatus>,
    },
    /// Move a stage to another status (open, in_progress, finished, cancelled)
    StageStatus {
        stage: Uuid,
        status: StageStatus,
    },
    AddCompetitor {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        license: Option<String>,
        #[arg(long)]
        license_expires_at: Option<DateTime<Utc>>,
    },
    /// Correct a competitor's profile; omitted fields are kept
    UpdateCompetitor {
        competitor: Uuid,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        license: Option<String>,
        #[arg(long)]
        license_expires_at: Option<DateTime<Utc>>,
        #[arg(long)]
        active: Option<bool>,
    },
    ListCompetitors {
        #[arg(long)]
        active: Option<bool>,
        #[arg(long)]
        banned: Option<bool>,
    },
    Register {
        stage: Uuid,
        competitor: Uuid,
    },
    ListRegistrations {
        stage: Option<Uuid>,
        #[arg(long)]
        competitor: Option<Uuid>,
        /// pending, paid, cancelled or refunded
        #[arg(long)]
        payment_status: Option<PaymentStatus>,
    },
    ConfirmPayment {
        registration: Uuid,
        #[arg(long)]
        receipt: Option<String>,
    },
    CancelPayment {
        registration: Uuid,
    },
    RefundPayment {
        registration: Uuid,
    },
    Eliminate {
        registration: Uuid,
        #[arg(long)]
        reason: String,
    },
    Ban {
        competitor: Uuid,
        #[arg(long)]
        reason: String,
    },
    Unban {
        competitor: Uuid,
    },
    RemoveCompetitor {
        competitor: Uuid,
    },
    SubmitCapture {
        registration: Uuid,
        /// tucunare_azul, tucunare_amarelo or traira
        #[arg(long)]
        species: String,
        #[arg(long)]
        size: Decimal,
        #[arg(long)]
        evidence: String,
        #[arg(long)]
        captured_at: Option<DateTime<Utc>>,
        #[arg(long)]
        notes: Option<String>,
    },
    ValidateCapture {
        capture: Uuid,
        #[arg(long = "by")]
        validated_by: String,
        #[arg(long, default_value = "0")]
        penalty: Decimal,
        #[arg(long)]
        penalty_reason: Option<String>,
    },
    AnnulCapture {
        capture: Uuid,
        #[arg(long)]
        reason: String,
    },
    RemoveCapture {
        capture: Uuid,
    },
    /// List captures, latest catch first
    ListCaptures {
        #[arg(long)]
        stage: Option<Uuid>,
        #[arg(long)]
        registration: Option<Uuid>,
        /// tucunare_azul, tucunare_amarelo or traira
        #[arg(long)]
        species: Option<Species>,
        /// pending, validated or annulled
        #[arg(long)]
        status: Option<CaptureStatus>,
        /// Shorthand for --status pending
        #[arg(long, conflicts_with = "status")]
        pending: bool,
    },
    GenerateRulers {
        stage: Uuid,
        #[arg(long)]
        count: i32,
    },
    /// Assign rulers to every registration of the stage still without one
    DrawRulers {
        stage: Uuid,
        /// sequential, shuffled or shuffled:<seed>; defaults to RULER_DRAW_MODE
        #[arg(long)]
        mode: Option<DrawMode>,
    },
    ReturnRuler {
        registration: Uuid,
    },
    ListRulers {
        stage: Uuid,
        #[arg(long)]
        available: Option<bool>,
    },
    /// Delete a ruler that was never handed out
    DeleteRuler {
        ruler: Uuid,
    },
    /// Rebuild and store the ranking snapshot of a stage
    Rank {
        stage: Uuid,
    },
    /// Print the stored ranking snapshot of a stage
    ShowRanking {
        stage: Uuid,
        /// overall, largest_blue, largest_yellow or largest_wolffish
        #[arg(long)]
        category: Option<RankingCategory>,
    },
    /// List stored ranking entries across stages
    ListRankings {
        #[arg(long)]
        stage: Option<Uuid>,
        #[arg(long)]
        edition: Option<Uuid>,
        #[arg(long)]
        competitor: Option<Uuid>,
        #[arg(long)]
        category: Option<RankingCategory>,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{json}");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("copa_admin={log_level},storage={log_level},engine={log_level}").into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!("Connecting to database at: {}", config.database_host());

    let db = Database::new(&config.database_url, config.max_connections)
        .await
        .context("Failed to initialize database")?;

    run(cli.command, &db, &config).await
}

async fn run(command: Commands, db: &Database, config: &Config) -> Result<()> {
    match command {
        Commands::Migrate => {
            db.run_migrations()
                .await
                .context("Failed to run migrations")?;
            tracing::info!("Database migrations completed successfully");
        }
        Commands::CreateEdition {
            year,
            name,
            description,
            inactive,
        } => {
            let request = CreateEditionRequest {
                year,
                name,
                description,
                active: !inactive,
            };
            print_json(&editions::create_edition(db, request).await?)?;
        }
        Commands::ActivateEdition { edition } => {
            print_json(&editions::activate_edition(db, edition).await?)?;
        }
        Commands::ListEditions => {
            print_json(&editions::list_editions(db).await?)?;
        }
        Commands::ActiveEdition => {
            print_json(&editions::active_edition(db).await?)?;
        }
        Commands::CreateStage {
            edition,
            name,
            location,
            starts_at,
            entry_fee,
            capacity,
        } => {
            let request = CreateStageRequest {
                edition_id: edition,
                name,
                location,
                starts_at,
                entry_fee,
                capacity,
            };
            print_json(&stages::create_stage(db, request).await?)?;
        }
        Commands::ListStages { edition, status } => {
            let filter = StageFilter {
                edition_id: edition,
                status,
            };
            print_json(&stages::list_stages(db, &filter).await?)?;
        }
        Commands::StageStatus { stage, status } => {
            print_json(&stages::transition_stage(db, stage, status).await?)?;
        }
        Commands::AddCompetitor {
            name,
            email,
            license,
            license_expires_at,
        } => {
            let request = CreateCompetitorRequest {
                name,
                email,
                license_number: license,
                license_expires_at,
            };
            print_json(&competitors::create_competitor(db, request).await?)?;
        }
        Commands::UpdateCompetitor {
            competitor,
            name,
            email,
            license,
            license_expires_at,
            active,
        } => {
            let request = UpdateCompetitorRequest {
                name,
                email,
                license_number: license,
                license_expires_at,
                active,
            };
            print_json(&competitors::update_competitor(db, competitor, request).await?)?;
        }
        Commands::ListCompetitors { active, banned } => {
            let filter = CompetitorFilter { active, banned };
            print_json(&competitors::list_competitors(db, &filter).await?)?;
        }
        Commands::Register { stage, competitor } => {
            let request = CreateRegistrationRequest {
                stage_id: stage,
                competitor_id: competitor,
            };
            print_json(&registrations::register(db, request).await?)?;
        }
        Commands::ListRegistrations {
            stage,
            competitor,
            payment_status,
        } => {
            let filter = RegistrationFilter {
                stage_id: stage,
                competitor_id: competitor,
                payment_status,
            };
            print_json(&registrations::list_registrations(db, &filter).await?)?;
        }
        Commands::ConfirmPayment {
            registration,
            receipt,
        } => {
            let request = ConfirmPaymentRequest {
                payment_receipt: receipt,
            };
            print_json(&registrations::confirm_payment(db, registration, request).await?)?;
        }
        Commands::CancelPayment { registration } => {
            print_json(&registrations::cancel_payment(db, registration).await?)?;
        }
        Commands::RefundPayment { registration } => {
            print_json(&registrations::refund_payment(db, registration).await?)?;
        }
        Commands::Eliminate {
            registration,
            reason,
        } => {
            let request = EliminateRequest { reason };
            print_json(&registrations::eliminate(db, registration, request).await?)?;
        }
        Commands::Ban { competitor, reason } => {
            let request = BanCompetitorRequest { reason };
            print_json(&competitors::ban_competitor(db, competitor, request).await?)?;
        }
        Commands::Unban { competitor } => {
            print_json(&competitors::unban_competitor(db, competitor).await?)?;
        }
        Commands::RemoveCompetitor { competitor } => {
            print_json(&competitors::remove_competitor(db, competitor).await?)?;
        }
        Commands::SubmitCapture {
            registration,
            species,
            size,
            evidence,
            captured_at,
            notes,
        } => {
            let request = CreateCaptureRequest {
                species,
                original_size: size,
                evidence_url: evidence,
                captured_at,
                notes,
            };
            print_json(&captures::submit_capture(db, registration, request).await?)?;
        }
        Commands::ValidateCapture {
            capture,
            validated_by,
            penalty,
            penalty_reason,
        } => {
            let request = ValidateCaptureRequest {
                validated_by,
                penalty,
                penalty_reason,
            };
            print_json(&captures::validate_capture(db, capture, request).await?)?;
        }
        Commands::AnnulCapture { capture, reason } => {
            let request = AnnulCaptureRequest { reason };
            print_json(&captures::annul_capture(db, capture, request).await?)?;
        }
        Commands::RemoveCapture { capture } => {
            print_json(&captures::remove_capture(db, capture).await?)?;
        }
        Commands::ListCaptures {
            stage,
            registration,
            species,
            status,
            pending,
        } => {
            let filter = CaptureFilter {
                stage_id: stage,
                registration_id: registration,
                species,
                status: if pending {
                    Some(CaptureStatus::Pending)
                } else {
                    status
                },
            };
            print_json(&captures::list_captures(db, &filter).await?)?;
        }
        Commands::GenerateRulers { stage, count } => {
            let request = GenerateRulersRequest { count };
            print_json(&rulers::generate_rulers(db, stage, request).await?)?;
        }
        Commands::DrawRulers { stage, mode } => {
            let mode = mode.unwrap_or(config.draw_mode);
            print_json(&rulers::draw_rulers(db, stage, mode).await?)?;
        }
        Commands::ReturnRuler { registration } => {
            print_json(&rulers::return_ruler(db, registration).await?)?;
        }
        Commands::ListRulers { stage, available } => {
            let filter = RulerFilter { available };
            print_json(&rulers::list_rulers(db, stage, &filter).await?)?;
        }
        Commands::DeleteRuler { ruler } => {
            print_json(&rulers::delete_ruler(db, ruler).await?)?;
        }
        Commands::Rank { stage } => {
            print_json(&ranking::rebuild_stage_ranking(db, stage).await?)?;
        }
        Commands::ShowRanking { stage, category } => {
            print_json(&ranking::stage_ranking(db, stage, category).await?)?;
        }
        Commands::ListRankings {
            stage,
            edition,
            competitor,
            category,
        } => {
            let filter = RankingFilter {
                stage_id: stage,
                edition_id: edition,
                competitor_id: competitor,
                category,
            };
            print_json(&ranking::list_rankings(db, &filter).await?)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_validate_capture() {
        let id = Uuid::new_v4().to_string();
        let cli = Cli::try_parse_from([
            "copa-admin",
            "validate-capture",
            &id,
            "--by",
            "fiscal.maria",
            "--penalty",
            "1.5",
        ])
        .unwrap();

        match cli.command {
            Commands::ValidateCapture {
                validated_by,
                penalty,
                penalty_reason,
                ..
            } => {
                assert_eq!(validated_by, "fiscal.maria");
                assert_eq!(penalty, Decimal::new(15, 1));
                assert!(penalty_reason.is_none());
            }
            _ => panic!("expected validate-capture"),
        }
    }

    #[test]
    fn test_parse_draw_mode_and_category() {
        let id = Uuid::new_v4().to_string();

        let cli =
            Cli::try_parse_from(["copa-admin", "draw-rulers", &id, "--mode", "shuffled:42"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::DrawRulers {
                mode: Some(DrawMode::Shuffled { seed: 42 }),
                ..
            }
        ));

        let cli = Cli::try_parse_from(["copa-admin", "draw-rulers", &id]).unwrap();
        assert!(matches!(cli.command, Commands::DrawRulers { mode: None, .. }));

        let cli = Cli::try_parse_from([
            "copa-admin",
            "show-ranking",
            &id,
            "--category",
            "largest_wolffish",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Commands::ShowRanking {
                category: Some(RankingCategory::LargestWolffish),
                ..
            }
        ));
    }

    #[test]
    fn test_parse_rejects_unknown_values() {
        let id = Uuid::new_v4().to_string();

        assert!(Cli::try_parse_from(["copa-admin", "stage-status", &id, "paused"]).is_err());
        assert!(Cli::try_parse_from(["copa-admin", "rank", "not-a-uuid"]).is_err());
        assert!(
            Cli::try_parse_from(["copa-admin", "draw-rulers", &id, "--mode", "random"]).is_err()
        );
    }

    #[test]
    fn test_parse_list_captures_pending_shorthand() {
        let id = Uuid::new_v4().to_string();
        let cli = Cli::try_parse_from([
            "copa-admin",
            "list-captures",
            "--stage",
            &id,
            "--species",
            "tucunare_azul",
            "--pending",
        ])
        .unwrap();

        match cli.command {
            Commands::ListCaptures {
                stage,
                species,
                status,
                pending,
                registration,
            } => {
                assert_eq!(stage.map(|s| s.to_string()), Some(id));
                assert_eq!(species, Some(Species::BluePeacockBass));
                assert!(pending);
                assert!(status.is_none());
                assert!(registration.is_none());
            }
            _ => panic!("expected list-captures"),
        }

        assert!(
            Cli::try_parse_from([
                "copa-admin",
                "list-captures",
                "--pending",
                "--status",
                "validated",
            ])
            .is_err()
        );
        assert!(Cli::try_parse_from(["copa-admin", "list-captures", "--species", "pirarucu"]).is_err());
    }

    #[test]
    fn test_parse_listings_take_optional_filters() {
        let id = Uuid::new_v4().to_string();

        let cli = Cli::try_parse_from(["copa-admin", "list-registrations", &id]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::ListRegistrations {
                stage: Some(_),
                payment_status: None,
                ..
            }
        ));

        let cli = Cli::try_parse_from([
            "copa-admin",
            "list-registrations",
            "--payment-status",
            "paid",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Commands::ListRegistrations {
                stage: None,
                payment_status: Some(PaymentStatus::Paid),
                ..
            }
        ));

        let cli =
            Cli::try_parse_from(["copa-admin", "list-rulers", &id, "--available", "true"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::ListRulers {
                available: Some(true),
                ..
            }
        ));

        let cli = Cli::try_parse_from(["copa-admin", "list-rankings", "--edition", &id]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::ListRankings {
                edition: Some(_),
                stage: None,
                ..
            }
        ));

        assert!(Cli::try_parse_from(["copa-admin", "list-rulers"]).is_err());
    }

    #[test]
    fn test_parse_update_competitor_partial() {
        let id = Uuid::new_v4().to_string();
        let cli = Cli::try_parse_from([
            "copa-admin",
            "update-competitor",
            &id,
            "--license",
            "AM-9001",
            "--active",
            "false",
        ])
        .unwrap();

        match cli.command {
            Commands::UpdateCompetitor {
                name,
                license,
                active,
                ..
            } => {
                assert!(name.is_none());
                assert_eq!(license.as_deref(), Some("AM-9001"));
                assert_eq!(active, Some(false));
            }
            _ => panic!("expected update-competitor"),
        }
    }

    #[test]
    fn test_parse_edition_commands() {
        let cli = Cli::try_parse_from([
            "copa-admin",
            "create-edition",
            "--year",
            "2026",
            "--name",
            "Copa 2026",
            "--inactive",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Commands::CreateEdition {
                year: 2026,
                inactive: true,
                ..
            }
        ));

        let cli = Cli::try_parse_from(["copa-admin", "active-edition"]).unwrap();
        assert!(matches!(cli.command, Commands::ActiveEdition));

        let id = Uuid::new_v4().to_string();
        let cli = Cli::try_parse_from([
            "copa-admin",
            "create-stage",
            "--edition",
            &id,
            "--name",
            "1ª Etapa",
            "--location",
            "Barcelos, AM",
            "--starts-at",
            "2026-09-12T06:00:00Z",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Commands::CreateStage {
                edition: Some(_),
                capacity: 0,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_removals_and_ruler_deletion() {
        let id = Uuid::new_v4().to_string();
        for command in ["remove-competitor", "remove-capture", "delete-ruler"] {
            assert!(Cli::try_parse_from(["copa-admin", command, &id]).is_ok());
            assert!(Cli::try_parse_from(["copa-admin", command]).is_err());
        }
    }

    #[test]
    fn test_parse_stage_status() {
        let id = Uuid::new_v4().to_string();
        let cli = Cli::try_parse_from(["copa-admin", "stage-status", &id, "in_progress"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::StageStatus {
                status: StageStatus::InProgress,
                ..
            }
        ));
    }
}
