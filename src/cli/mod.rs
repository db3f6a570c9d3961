//! Command-line admin console for the Motorista API.
//!
//! Subcommands:
//! - `login` / `logout` / `whoami` - session management
//! - `motoristas list` - filtered, paginated driver listing
//! - `motoristas show|create|update|delete` - driver CRUD
//! - `vehicle-types` - the vehicle-type catalog
//!
//! This layer only renders and collects input; session, caching, and HTTP
//! live in the library modules.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;

use crate::api::ApiError;
use crate::guard::GuardState;
use crate::model::{
    CreateDriverRequest, Driver, DriverFilter, Page, Role, SortSpec, Status, TipoVeiculo,
    UpdateDriverRequest,
};
use crate::session::SessionError;
use crate::validation::{self, ValidationErrors};
use crate::AppContext;

/// CLI arguments structure
#[derive(Parser, Debug)]
#[command(name = "motorista-admin")]
#[command(author, version, about = "Admin console for the Motorista freight-matching API", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "motorista-admin.toml")]
    pub config: PathBuf,

    /// Override log level
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Backend API base URL (overrides the config file)
    #[arg(long, env = "MOTORISTA_API_URL")]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Authenticate and persist the session
    Login {
        /// Account email
        #[arg(long)]
        email: String,
        /// Password (prompted when omitted; can be set via MOTORISTA_SENHA)
        #[arg(long, env = "MOTORISTA_SENHA", hide_env_values = true)]
        senha: Option<String>,
    },

    /// End the session and clear persisted state
    Logout,

    /// Show the authenticated user
    Whoami,

    /// Driver management commands
    #[command(subcommand)]
    Motoristas(MotoristaCommands),

    /// List the vehicle-type catalog
    VehicleTypes,
}

/// Driver subcommands
#[derive(Subcommand, Debug)]
pub enum MotoristaCommands {
    /// List drivers with filters and pagination
    List {
        /// Free-text search over name, email and phone
        #[arg(long)]
        texto: Option<String>,
        /// Two-letter state code
        #[arg(long)]
        uf: Option<String>,
        /// City name
        #[arg(long)]
        cidade: Option<String>,
        /// Vehicle type filter (repeatable), e.g. --tipo VAN --tipo BAU
        #[arg(long = "tipo")]
        tipos: Vec<TipoVeiculo>,
        /// Zero-based page index
        #[arg(long, default_value = "0")]
        page: u32,
        /// Page size (defaults to the configured listing size)
        #[arg(long)]
        size: Option<u32>,
        /// Sort as `field,asc|desc` (defaults to the configured sort)
        #[arg(long)]
        sort: Option<String>,
    },
    /// Show one driver
    Show {
        /// Driver id
        id: String,
    },
    /// Create a driver
    Create {
        #[arg(long)]
        nome: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        senha: String,
        #[arg(long)]
        telefone: String,
        #[arg(long)]
        cidade: String,
        #[arg(long)]
        uf: String,
        /// Vehicle types (repeatable)
        #[arg(long = "tipo")]
        tipos: Vec<TipoVeiculo>,
        /// USUARIO, MOTORISTA or ADMIN
        #[arg(long, default_value = "MOTORISTA")]
        role: Role,
        /// ATIVO, INATIVO or BLOQUEADO
        #[arg(long, default_value = "ATIVO")]
        status: Status,
    },
    /// Update a driver (only the provided fields change)
    Update {
        /// Driver id
        id: String,
        #[arg(long)]
        nome: Option<String>,
        #[arg(long)]
        email: Option<String>,
        /// New password; leave out to keep the current one
        #[arg(long)]
        senha: Option<String>,
        #[arg(long)]
        telefone: Option<String>,
        #[arg(long)]
        cidade: Option<String>,
        #[arg(long)]
        uf: Option<String>,
        /// Replacement vehicle types (repeatable)
        #[arg(long = "tipo")]
        tipos: Vec<TipoVeiculo>,
        #[arg(long)]
        role: Option<Role>,
        #[arg(long)]
        status: Option<Status>,
    },
    /// Delete a driver
    Delete {
        /// Driver id
        id: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

// ============================================================================
// Pagination strip
// ============================================================================

/// One slot in the rendered pagination strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageItem {
    Num(u32),
    Ellipsis,
}

/// Compute the page-number strip: at most five numbered slots with ellipses
/// around the current window.
pub fn page_numbers(current: u32, total: u32) -> Vec<PageItem> {
    const MAX_VISIBLE: u32 = 5;
    let mut pages = Vec::new();

    if total <= MAX_VISIBLE {
        pages.extend((0..total).map(PageItem::Num));
    } else if current <= 2 {
        pages.extend((0..3).map(PageItem::Num));
        pages.push(PageItem::Ellipsis);
        pages.push(PageItem::Num(total - 1));
    } else if current >= total - 3 {
        pages.push(PageItem::Num(0));
        pages.push(PageItem::Ellipsis);
        pages.extend((total - 3..total).map(PageItem::Num));
    } else {
        pages.push(PageItem::Num(0));
        pages.push(PageItem::Ellipsis);
        pages.extend((current - 1..=current + 1).map(PageItem::Num));
        pages.push(PageItem::Ellipsis);
        pages.push(PageItem::Num(total - 1));
    }

    pages
}

fn render_pagination(page: &Page<Driver>) {
    if page.total_pages <= 1 {
        return;
    }
    let strip: Vec<String> = page_numbers(page.number, page.total_pages)
        .into_iter()
        .map(|item| match item {
            PageItem::Num(n) if n == page.number => format!("[{}]", n + 1),
            PageItem::Num(n) => format!("{}", n + 1),
            PageItem::Ellipsis => "...".to_string(),
        })
        .collect();
    println!();
    println!("Páginas: {}", strip.join(" "));
}

// ============================================================================
// Error rendering
// ============================================================================

/// Backend conflict messages that echo the submitted email are replaced with
/// a fixed message instead of repeating raw user input.
fn conflict_display(message: &str, submitted_email: &str) -> String {
    if !submitted_email.is_empty() && message.contains(submitted_email) {
        "Já existe um cadastro com este email.".to_string()
    } else {
        message.to_string()
    }
}

fn print_validation_errors(errors: &ValidationErrors) {
    eprintln!("Dados inválidos:");
    for (field, messages) in errors.field_errors() {
        for message in messages {
            eprintln!("  {}: {}", field, message);
        }
    }
}

fn print_api_error(err: &ApiError, submitted_email: &str) {
    match err {
        ApiError::Conflict(message) => {
            eprintln!("Erro: {}", conflict_display(message, submitted_email));
        }
        ApiError::SessionExpired => {
            eprintln!("Sessão expirada. Entre novamente com 'motorista-admin login'.");
        }
        other => eprintln!("Erro: {}", other),
    }
}

// ============================================================================
// Command handlers
// ============================================================================

/// Run a CLI command against a wired application context. The session must
/// already have been restored.
pub async fn run_command(cli: &Cli, ctx: &AppContext) -> Result<()> {
    match &cli.command {
        Commands::Login { email, senha } => cmd_login(ctx, email, senha.as_deref()).await,
        Commands::Logout => {
            ctx.session.logout();
            println!("Sessão encerrada.");
            Ok(())
        }
        Commands::Whoami => cmd_whoami(ctx),
        Commands::VehicleTypes => {
            require_authenticated(ctx).await?;
            cmd_vehicle_types(ctx).await
        }
        Commands::Motoristas(command) => {
            require_authenticated(ctx).await?;
            match command {
                MotoristaCommands::List {
                    texto,
                    uf,
                    cidade,
                    tipos,
                    page,
                    size,
                    sort,
                } => cmd_list(ctx, texto, uf, cidade, tipos, *page, *size, sort.as_deref()).await,
                MotoristaCommands::Show { id } => cmd_show(ctx, id).await,
                MotoristaCommands::Create {
                    nome,
                    email,
                    senha,
                    telefone,
                    cidade,
                    uf,
                    tipos,
                    role,
                    status,
                } => {
                    let payload = CreateDriverRequest {
                        nome: nome.clone(),
                        email: email.clone(),
                        senha: senha.clone(),
                        telefone: telefone.clone(),
                        cidade: cidade.clone(),
                        uf: uf.to_uppercase(),
                        role: *role,
                        status: *status,
                        tipos_veiculo: tipos.clone(),
                    };
                    cmd_create(ctx, payload).await
                }
                MotoristaCommands::Update {
                    id,
                    nome,
                    email,
                    senha,
                    telefone,
                    cidade,
                    uf,
                    tipos,
                    role,
                    status,
                } => {
                    let payload = UpdateDriverRequest {
                        nome: nome.clone(),
                        email: email.clone(),
                        senha: senha.clone(),
                        telefone: telefone.clone(),
                        cidade: cidade.clone(),
                        uf: uf.as_ref().map(|s| s.to_uppercase()),
                        role: *role,
                        status: *status,
                        tipos_veiculo: if tipos.is_empty() {
                            None
                        } else {
                            Some(tipos.clone())
                        },
                    }
                    .normalized();
                    cmd_update(ctx, id, payload).await
                }
                MotoristaCommands::Delete { id, yes } => cmd_delete(ctx, id, *yes).await,
            }
        }
    }
}

/// Block protected commands until the guard resolves; unauthenticated users
/// are sent to `login`.
async fn require_authenticated(ctx: &AppContext) -> Result<()> {
    let mut guard = ctx.guard();
    match guard.wait_until_resolved().await {
        GuardState::Authenticated => Ok(()),
        _ => anyhow::bail!("Nenhuma sessão ativa. Use 'motorista-admin login' para entrar."),
    }
}

async fn cmd_login(ctx: &AppContext, email: &str, senha: Option<&str>) -> Result<()> {
    let senha = match senha {
        Some(senha) => senha.to_string(),
        None => prompt("Senha: ")?,
    };

    match ctx.session.login(email, &senha).await {
        Ok(user) => {
            println!("Bem-vindo, {} ({})", user.nome, user.role.as_str());
            Ok(())
        }
        Err(SessionError::Api(ApiError::InvalidCredentials(message))) => {
            anyhow::bail!("Falha no login: {}", message)
        }
        Err(err) => anyhow::bail!("Falha no login: {}", err),
    }
}

fn cmd_whoami(ctx: &AppContext) -> Result<()> {
    match ctx.session.current_user() {
        Some(user) => {
            let id = if user.id.is_empty() { "-" } else { user.id.as_str() };
            println!("ID:     {}", id);
            println!("Nome:   {}", user.nome);
            println!("Email:  {}", user.email);
            println!("Perfil: {}", user.role.as_str());
        }
        None => println!("Nenhuma sessão ativa."),
    }
    Ok(())
}

async fn cmd_vehicle_types(ctx: &AppContext) -> Result<()> {
    match ctx.queries.vehicle_types().await {
        Ok(types) => {
            println!("{:<16} LABEL", "VALOR");
            for vt in types {
                println!("{:<16} {}", vt.value, vt.label);
            }
            Ok(())
        }
        Err(err) => {
            print_api_error(&err, "");
            anyhow::bail!("falha ao listar tipos de veículo")
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn cmd_list(
    ctx: &AppContext,
    texto: &Option<String>,
    uf: &Option<String>,
    cidade: &Option<String>,
    tipos: &[TipoVeiculo],
    page: u32,
    size: Option<u32>,
    sort: Option<&str>,
) -> Result<()> {
    let filter = DriverFilter {
        texto: texto.clone(),
        uf: uf.clone(),
        cidade: cidade.clone(),
        tipos_veiculo: if tipos.is_empty() {
            None
        } else {
            Some(tipos.to_vec())
        },
    };
    let size = size.unwrap_or(ctx.config.listing.page_size);
    let sort = sort
        .map(SortSpec::parse)
        .unwrap_or_else(|| SortSpec::parse(&ctx.config.listing.sort));

    match ctx.queries.list_drivers(&filter, page, size, &sort).await {
        Ok(result) => {
            print_driver_table(&result.content);
            println!();
            println!(
                "Página {} de {} — {} registro(s)",
                result.number + 1,
                result.total_pages.max(1),
                result.total_elements
            );
            render_pagination(&result);
            Ok(())
        }
        Err(err) => {
            print_api_error(&err, "");
            anyhow::bail!("falha ao listar motoristas")
        }
    }
}

async fn cmd_show(ctx: &AppContext, id: &str) -> Result<()> {
    match ctx.queries.get_driver(id).await {
        Ok(driver) => {
            print_driver_details(&driver);
            Ok(())
        }
        Err(ApiError::NotFound(_)) => anyhow::bail!("Motorista não encontrado."),
        Err(err) => {
            print_api_error(&err, "");
            anyhow::bail!("falha ao buscar motorista")
        }
    }
}

async fn cmd_create(ctx: &AppContext, payload: CreateDriverRequest) -> Result<()> {
    if let Err(errors) = validation::validate_create(&payload) {
        print_validation_errors(&errors);
        anyhow::bail!("cadastro não enviado");
    }

    match ctx.queries.create_driver(&payload).await {
        Ok(driver) => {
            println!("Motorista cadastrado com sucesso (id {}).", driver.id);
            Ok(())
        }
        Err(err) => {
            print_api_error(&err, &payload.email);
            anyhow::bail!("falha ao cadastrar motorista")
        }
    }
}

async fn cmd_update(ctx: &AppContext, id: &str, payload: UpdateDriverRequest) -> Result<()> {
    if let Err(errors) = validation::validate_update(&payload) {
        print_validation_errors(&errors);
        anyhow::bail!("atualização não enviada");
    }

    let submitted_email = payload.email.clone().unwrap_or_default();
    match ctx.queries.update_driver(id, &payload).await {
        Ok(driver) => {
            println!("Motorista {} atualizado com sucesso.", driver.nome);
            Ok(())
        }
        Err(ApiError::NotFound(_)) => anyhow::bail!("Motorista não encontrado."),
        Err(err) => {
            print_api_error(&err, &submitted_email);
            anyhow::bail!("falha ao atualizar motorista")
        }
    }
}

async fn cmd_delete(ctx: &AppContext, id: &str, yes: bool) -> Result<()> {
    if !yes {
        let answer = prompt(&format!(
            "Tem certeza que deseja excluir o motorista {}? [s/N] ",
            id
        ))?;
        if !answer.trim().eq_ignore_ascii_case("s") {
            println!("Exclusão cancelada.");
            return Ok(());
        }
    }

    match ctx.queries.delete_driver(id).await {
        Ok(()) => {
            println!("Motorista excluído com sucesso.");
            Ok(())
        }
        Err(ApiError::NotFound(_)) => anyhow::bail!("Motorista não encontrado."),
        Err(err) => {
            print_api_error(&err, "");
            anyhow::bail!("falha ao excluir motorista")
        }
    }
}

// ============================================================================
// Rendering helpers
// ============================================================================

fn truncate(value: &str, max: usize) -> String {
    if value.chars().count() <= max {
        value.to_string()
    } else {
        let cut: String = value.chars().take(max.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}

fn print_driver_table(drivers: &[Driver]) {
    if drivers.is_empty() {
        println!("Nenhum motorista encontrado.");
        return;
    }

    println!(
        "{:<10} {:<24} {:<28} {:<18} {:<10} {:<10} VEÍCULOS",
        "ID", "NOME", "EMAIL", "CIDADE/UF", "PERFIL", "STATUS"
    );
    for driver in drivers {
        let veiculos: Vec<&str> = driver.tipos_veiculo.iter().map(|t| t.label()).collect();
        println!(
            "{:<10} {:<24} {:<28} {:<18} {:<10} {:<10} {}",
            truncate(&driver.id, 10),
            truncate(&driver.nome, 24),
            truncate(&driver.email, 28),
            truncate(&format!("{}/{}", driver.cidade, driver.uf), 18),
            driver.perfil.as_str(),
            driver.status.as_str(),
            veiculos.join(", ")
        );
    }
}

fn print_driver_details(driver: &Driver) {
    println!("ID:        {}", driver.id);
    println!("Nome:      {}", driver.nome);
    println!("Email:     {}", driver.email);
    println!("Telefone:  {}", driver.telefone);
    println!("Cidade/UF: {}/{}", driver.cidade, driver.uf);
    println!("Perfil:    {}", driver.perfil.as_str());
    println!("Status:    {}", driver.status.as_str());
    let veiculos: Vec<&str> = driver.tipos_veiculo.iter().map(|t| t.label()).collect();
    println!(
        "Veículos:  {}",
        if veiculos.is_empty() {
            "-".to_string()
        } else {
            veiculos.join(", ")
        }
    );
    if let Some(created_at) = driver.created_at {
        println!("Criado em: {}", created_at.to_rfc3339());
    }
}

fn prompt(label: &str) -> Result<String> {
    print!("{label}");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nums(items: &[PageItem]) -> Vec<Option<u32>> {
        items
            .iter()
            .map(|item| match item {
                PageItem::Num(n) => Some(*n),
                PageItem::Ellipsis => None,
            })
            .collect()
    }

    #[test]
    fn test_page_numbers_first_page_of_seven() {
        let items = page_numbers(0, 7);
        assert_eq!(nums(&items), vec![Some(0), Some(1), Some(2), None, Some(6)]);
    }

    #[test]
    fn test_page_numbers_middle_page_of_seven() {
        let items = page_numbers(3, 7);
        assert_eq!(
            nums(&items),
            vec![Some(0), None, Some(2), Some(3), Some(4), None, Some(6)]
        );
    }

    #[test]
    fn test_page_numbers_tail_window() {
        let items = page_numbers(5, 7);
        assert_eq!(nums(&items), vec![Some(0), None, Some(4), Some(5), Some(6)]);
    }

    #[test]
    fn test_page_numbers_small_totals_show_everything() {
        assert_eq!(nums(&page_numbers(0, 1)), vec![Some(0)]);
        assert_eq!(
            nums(&page_numbers(2, 5)),
            vec![Some(0), Some(1), Some(2), Some(3), Some(4)]
        );
    }

    #[test]
    fn test_conflict_display_hides_submitted_email() {
        let message = "Email ana@exemplo.com já cadastrado";
        assert_eq!(
            conflict_display(message, "ana@exemplo.com"),
            "Já existe um cadastro com este email."
        );
        assert_eq!(conflict_display(message, "outra@exemplo.com"), message);
        assert_eq!(conflict_display(message, ""), message);
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("São Paulo", 20), "São Paulo");
        assert_eq!(truncate("São Paulo dos Campos", 9), "São Paul…");
    }
}
