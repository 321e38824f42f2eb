use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use crm_dashboard::crm::models::{CreateDealPayload, DealProperties, DealStage};
use crm_dashboard::{
    logging, ChatClient, ChatSession, Config, CrmClient, CrmError, LogNotifier, Notice, Notifier,
    PageSize, Paginator,
};
use std::io::{self, BufRead, Write};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "crm-dashboard", version, about = "Contacts, deals and deal chat from the terminal")]
struct Cli {
    /// REST server base URL
    #[arg(long, global = true, env = "CRM_SERVER_URL")]
    server_url: Option<String>,
    /// Deal-chat endpoint; derived from the server URL when unset
    #[arg(long, global = true, env = "CRM_CHAT_URL")]
    chat_url: Option<String>,
    /// Bearer key for the chat endpoint
    #[arg(long, global = true, env = "CRM_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List contacts one page at a time
    Contacts {
        #[arg(long, default_value_t = 1)]
        page: i64,
        #[arg(long, default_value_t = PageSize::default())]
        page_size: PageSize,
    },
    /// List deals, optionally only those of one contact
    Deals {
        #[arg(long)]
        contact: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: i64,
        #[arg(long, default_value_t = PageSize::default())]
        page_size: PageSize,
    },
    /// Update a contact's properties
    UpdateContact {
        id: String,
        #[arg(long)]
        firstname: Option<String>,
        #[arg(long)]
        lastname: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        address: Option<String>,
    },
    DeleteContact { id: String },
    CreateDeal {
        #[arg(long)]
        contact: String,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        amount: String,
        #[arg(long, default_value = "appointmentscheduled")]
        stage: DealStage,
    },
    /// Move a deal to another stage
    SetStage { contact: String, deal: String, stage: DealStage },
    DeleteDeal { id: String },
    /// Chat about a deal; reads questions from stdin when no message is given
    Chat {
        #[arg(long)]
        contact: String,
        #[arg(long)]
        deal: String,
        message: Vec<String>,
    },
}

impl Cli {
    fn config(&self) -> Config {
        Config::resolve(
            self.server_url.clone(),
            self.chat_url.clone(),
            self.api_key.clone(),
        )
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    logging::init(if cli.verbose { "debug" } else { "info" });

    let config = cli.config();
    tracing::debug!(?config, "configuration loaded");

    let crm = CrmClient::from_config(&config);
    let notifier = LogNotifier;

    match cli.command {
        Command::Contacts { page, page_size } => {
            let contacts = crm.get_contacts().await?;
            let mut pager = Paginator::with_page_size(contacts, page_size);
            pager.go_to_page(page);
            for contact in pager.paginated_data() {
                println!(
                    "{:<12} {:<28} {:<32} {}",
                    contact.id,
                    contact.full_name(),
                    contact.properties.email,
                    contact.properties.phone
                );
            }
            print_footer(&pager);
        }
        Command::Deals {
            contact,
            page,
            page_size,
        } => {
            let deals = match contact {
                Some(id) => crm.get_contact_deals(&id).await?,
                None => crm.get_deals().await?,
            };
            let mut pager = Paginator::with_page_size(deals, page_size);
            pager.go_to_page(page);
            for deal in pager.paginated_data() {
                println!(
                    "{:<12} {:<32} ${:<12} {}",
                    deal.id, deal.properties.dealname, deal.properties.amount, deal.properties.dealstage
                );
            }
            print_footer(&pager);
        }
        Command::UpdateContact {
            id,
            firstname,
            lastname,
            email,
            phone,
            address,
        } => {
            let mut properties = crm.get_contact(&id).await?.properties;
            for (field, value) in [
                (&mut properties.firstname, firstname),
                (&mut properties.lastname, lastname),
                (&mut properties.email, email),
                (&mut properties.phone, phone),
                (&mut properties.address, address),
            ] {
                if let Some(value) = value {
                    *field = value;
                }
            }
            let result = crm.update_contact(&id, &properties).await;
            return Ok(report(&notifier, result, "Contact updated successfully", "Failed to update contact"));
        }
        Command::DeleteContact { id } => {
            let result = crm.delete_contact(&id).await;
            return Ok(report(&notifier, result, "Contact deleted successfully", "Failed to delete contact"));
        }
        Command::CreateDeal {
            contact,
            name,
            amount,
            stage,
        } => {
            let payload = CreateDealPayload {
                deal_properties: DealProperties {
                    dealname: name,
                    amount,
                    dealstage: stage,
                },
                contact_id: contact,
            };
            let result = crm.create_deal(&payload).await;
            return Ok(report(&notifier, result, "Deal created successfully", "Failed to create deal"));
        }
        Command::SetStage {
            contact,
            deal,
            stage,
        } => {
            let mut found = crm
                .get_contact_deals(&contact)
                .await?
                .into_iter()
                .find(|d| d.id == deal)
                .ok_or_else(|| anyhow!("deal {} not found for contact {}", deal, contact))?;
            found.properties.dealstage = stage;
            let result = crm.update_deal(&found.id, &found.properties).await;
            return Ok(report(&notifier, result, "Deal updated successfully", "Failed to update deal"));
        }
        Command::DeleteDeal { id } => {
            let result = crm.delete_deal(&id).await;
            return Ok(report(&notifier, result, "Deal deleted successfully", "Failed to delete deal"));
        }
        Command::Chat {
            contact,
            deal,
            message,
        } => {
            let contact = crm.get_contact(&contact).await?;
            let deal = crm
                .get_contact_deals(&contact.id)
                .await?
                .into_iter()
                .find(|d| d.id == deal)
                .ok_or_else(|| anyhow!("deal {} not found for contact {}", deal, contact.id))?;
            let client = ChatClient::from_config(&config);
            let mut session = ChatSession::new(deal, contact);

            if !message.is_empty() {
                return Ok(ask(&mut session, &client, &message.join(" "), &notifier).await);
            }

            eprintln!("Discussing: {}", session.deal().properties.dealname);
            let stdin = io::stdin();
            for line in stdin.lock().lines() {
                let line = line.context("reading stdin")?;
                // Failures were already reported; keep the conversation open.
                ask(&mut session, &client, &line, &notifier).await;
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Failures are reported through the notifier only; the caller just sees the exit code.
async fn ask<N: Notifier>(
    session: &mut ChatSession,
    client: &ChatClient,
    text: &str,
    notifier: &N,
) -> ExitCode {
    let before = session.messages().len();
    if session.send(client, text, notifier).await.is_err() {
        return ExitCode::FAILURE;
    }
    if let Some(reply) = session.messages().get(before + 1) {
        println!("{}", reply.content);
        io::stdout().flush().ok();
    }
    ExitCode::SUCCESS
}

fn print_footer<T>(pager: &Paginator<T>) {
    println!(
        "-- {} (page {}/{}, {} per page)",
        pager.range_label(),
        pager.current_page(),
        pager.total_pages().max(1),
        pager.page_size()
    );
}

fn report<T, N: Notifier>(
    notifier: &N,
    result: Result<T, CrmError>,
    success: &str,
    failure: &str,
) -> ExitCode {
    match result {
        Ok(_) => {
            notifier.notify(Notice::success(success));
            ExitCode::SUCCESS
        }
        Err(err) => {
            notifier.notify(Notice::error(failure, err.to_string()));
            ExitCode::FAILURE
        }
    }
}
