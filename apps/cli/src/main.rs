use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{anyhow, bail, Result};
use clap::{Args, Parser, Subcommand};
use client_core::{
    format::display_wire_date,
    registration::{RegistrationSnapshot, StatusKind},
    session::login_failure_message,
    signup::{signup_failure_message, SIGNUP_OK_MESSAGE},
    ApiClient, ClientError, Desk, LoginForm, View,
};
use commands::{open_request, require_role, stage_label, submit_failure_message, LOGIN_HINT};
use shared::{
    domain::{Role, StatusFilter, StudentId},
    protocol::{InternRequest, RegistrationFormData, SignupForm},
};
use storage::Storage;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

#[derive(Parser, Debug)]
#[command(name = "stage-desk", about = "Internship request desk")]
struct Cli {
    /// Base url of the internship service.
    #[arg(long)]
    api_url: Option<String>,
    /// Local storage location (sqlite url or file path).
    #[arg(long)]
    storage_url: Option<String>,
    #[arg(long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login {
        /// Defaults to the remembered identifier.
        #[arg(long)]
        id: Option<String>,
        #[arg(long)]
        password: String,
        #[arg(long)]
        remember: bool,
    },
    Logout,
    Whoami,
    Signup(SignupArgs),
    #[command(subcommand)]
    Request(RequestCommand),
    #[command(subcommand)]
    Review(ReviewCommand),
}

#[derive(Args, Debug)]
struct SignupArgs {
    #[arg(long)]
    id: String,
    #[arg(long)]
    nom: String,
    #[arg(long)]
    prenom: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    tel: String,
    #[arg(long)]
    password: String,
    #[arg(long)]
    confirm_password: String,
    #[arg(long)]
    sexe: String,
    #[arg(long)]
    date_naissance: String,
    #[arg(long)]
    classe: String,
    #[arg(long)]
    specialite: String,
    #[arg(long)]
    faculte: String,
}

#[derive(Subcommand, Debug)]
enum RequestCommand {
    Status,
    Submit {
        /// Start a new request ("Nouvelle demande") instead of editing the
        /// current one; required once the current one has been decided.
        #[arg(long)]
        new: bool,
        #[arg(long)]
        start_date: String,
        #[arg(long)]
        end_date: String,
        /// initiation, perfectionnement or PFE.
        #[arg(long)]
        stage_type: String,
        #[arg(long)]
        country: String,
        #[arg(long)]
        introduction: String,
        #[arg(long)]
        direction: String,
    },
}

#[derive(Subcommand, Debug)]
enum ReviewCommand {
    List {
        #[arg(long, default_value = "")]
        search: String,
        /// all, accepted, rejected or pending.
        #[arg(long, default_value = "all")]
        status: String,
    },
    Show {
        id: String,
    },
    Accept {
        id: String,
    },
    Reject {
        id: String,
    },
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let settings =
        config::load_settings(cli.config.as_deref())?.with_overrides(cli.api_url, cli.storage_url);
    settings.validate()?;
    tracing::debug!(api = %settings.api_base_url, storage = %settings.storage_url, "settings loaded");

    let storage = Storage::new(&config::normalize_storage_url(&settings.storage_url)).await?;
    let api = ApiClient::with_timeout(
        &settings.api_base_url,
        Duration::from_secs(settings.request_timeout_secs),
    )?;
    let desk = Desk::new(api, Arc::new(storage));

    match cli.command {
        Command::Login {
            id,
            password,
            remember,
        } => login(&desk, id, password, remember).await,
        Command::Logout => {
            desk.login().logout().await?;
            println!("Déconnecté.");
            Ok(())
        }
        Command::Whoami => whoami(&desk).await,
        Command::Signup(args) => signup(&desk, args).await,
        Command::Request(command) => request(&desk, command).await,
        Command::Review(command) => review(&desk, command).await,
    }
}

async fn login(desk: &Desk, id: Option<String>, password: String, remember: bool) -> Result<()> {
    let controller = desk.login();
    let mut form = controller.initial_form().await?;
    if let Some(id) = id {
        form.id = id;
    }
    let form = LoginForm {
        password,
        remember_me: remember,
        ..form
    };

    match controller.login(&form).await {
        Ok(outcome) => {
            println!("Connexion réussie : {}", outcome.session.user_id);
            println!("{}", view_hint(outcome.view));
            Ok(())
        }
        Err(err) => bail!(login_failure_message(&err)),
    }
}

fn view_hint(view: View) -> &'static str {
    match view {
        View::Registration => "Demande de stage : `stage-desk request status`",
        View::SupervisorDashboard => "Tableau de bord encadreur : `stage-desk review list`",
        View::AdminDashboard => "Tableau de bord administrateur.",
        View::Login => LOGIN_HINT,
    }
}

async fn whoami(desk: &Desk) -> Result<()> {
    match desk.session().current().await? {
        Some(session) => {
            let role = session
                .role()
                .map(Role::as_wire)
                .unwrap_or(session.role.as_str());
            println!("{} ({role})", session.user_id);
        }
        None => println!("Aucune session active."),
    }
    Ok(())
}

async fn signup(desk: &Desk, args: SignupArgs) -> Result<()> {
    let mut form = SignupForm {
        id: args.id,
        nom: args.nom,
        prenom: args.prenom,
        email: args.email,
        tel: args.tel,
        mdp: args.password,
        confirmer_mdp: args.confirm_password,
        sexe: args.sexe,
        date_naissance: args.date_naissance,
        classe: args.classe,
        specialite: args.specialite,
        faculte: args.faculte,
    };
    match desk.signup().submit(&mut form).await {
        Ok(()) => {
            println!("{SIGNUP_OK_MESSAGE}");
            Ok(())
        }
        Err(err) => bail!(signup_failure_message(&err)),
    }
}

async fn request(desk: &Desk, command: RequestCommand) -> Result<()> {
    require_role(desk, Role::Student).await?;

    match command {
        RequestCommand::Status => {
            let controller = open_request(desk, false).await?;
            print_registration(&controller.snapshot().await);
            Ok(())
        }
        RequestCommand::Submit {
            new,
            start_date,
            end_date,
            stage_type,
            country,
            introduction,
            direction,
        } => {
            let controller = open_request(desk, new).await?;
            controller
                .set_form(RegistrationFormData {
                    start_date,
                    end_date,
                    stage_type,
                    country,
                    presenter_vous: introduction,
                    direction,
                })
                .await;
            let result = controller.submit().await;
            let snapshot = controller.snapshot().await;
            match result {
                Ok(_) => {
                    print_registration(&snapshot);
                    Ok(())
                }
                Err(err) => bail!(submit_failure_message(&err, snapshot.error)),
            }
        }
    }
}

fn print_registration(snapshot: &RegistrationSnapshot) {
    if let Some(success) = &snapshot.success {
        println!("{success}");
    }
    match &snapshot.status_message {
        Some(message) => {
            let marker = match message.kind {
                StatusKind::Success => "[accepté]",
                StatusKind::Error => "[refusé]",
                StatusKind::Pending => "[en attente]",
            };
            println!("{marker} {}", message.text);
        }
        None => println!("Aucune demande de stage enregistrée."),
    }
    if snapshot.form_submitted {
        let form = &snapshot.form;
        println!(
            "  {} -> {} | {} | {} | {}",
            display_wire_date(&form.start_date),
            display_wire_date(&form.end_date),
            stage_label(&form.stage_type),
            form.country,
            form.direction
        );
    }
}

async fn review(desk: &Desk, command: ReviewCommand) -> Result<()> {
    require_role(desk, Role::Supervisor).await?;
    let controller = desk.review();
    if let Err(err) = controller.load().await {
        let message = controller.error().await.unwrap_or_else(|| err.to_string());
        bail!(message);
    }

    match command {
        ReviewCommand::List { search, status } => {
            let filter: StatusFilter = status.parse().map_err(|err: String| anyhow!(err))?;
            controller.set_search(search).await;
            controller.set_filter(filter).await;
            let rows = controller.visible().await;
            if rows.is_empty() {
                println!("Aucun stagiaire ne correspond.");
            }
            for row in &rows {
                print_row(row);
            }
            Ok(())
        }
        ReviewCommand::Show { id } => {
            let Some(row) = controller.select(&StudentId::new(id.clone())).await else {
                bail!("Stagiaire introuvable : {id}.");
            };
            print_row(&row);
            println!("  {}", row.presenter_vous);
            Ok(())
        }
        ReviewCommand::Accept { id } => decide(&controller, id, true).await,
        ReviewCommand::Reject { id } => decide(&controller, id, false).await,
        ReviewCommand::Stats => {
            let stats = controller.stats().await;
            println!("Total stagiaires : {}", stats.total);
            println!("Acceptés : {}", stats.accepted);
            println!("Refusés : {}", stats.rejected);
            println!("En attente : {}", stats.pending);
            Ok(())
        }
    }
}

async fn decide(controller: &client_core::ReviewController, id: String, accept: bool) -> Result<()> {
    let ids = StudentId::new(id);
    let result = if accept {
        controller.accept(&ids).await
    } else {
        controller.reject(&ids).await
    };
    match result {
        Ok(decision) => {
            println!("{}", decision.notice);
            Ok(())
        }
        Err(ClientError::Validation(err)) => bail!(err.to_string()),
        Err(_) => {
            let message = controller
                .error()
                .await
                .unwrap_or_else(|| client_core::review::UPDATE_FAILED_MESSAGE.to_string());
            bail!(message)
        }
    }
}

fn print_row(row: &InternRequest) {
    println!(
        "{:<8} {:<12} {:<24} {:<16} {:<20} {} -> {}",
        row.ids,
        row.status().label(),
        stage_label(&row.nature_stage),
        row.pays,
        row.direction,
        display_wire_date(&row.date_debut),
        display_wire_date(&row.date_fin)
    );
}
