use std::path::{Path, PathBuf};
use std::sync::Arc;

use boardclient::BoardClient;
use boardclient::config::{ClientConfig, ConfigError};
use boardclient::navigation::Navigator;
use boardclient::net::ApiError;
use boardclient::net::api::{admin, comments, files, posts};
use boardclient::net::types::{
    ALL_CATEGORIES, CommentRequest, FileUpload, LikeType, LoginRequest, PostRequest, RegisterRequest, SearchType,
    SortBy,
};
use boardclient::notify::{Notice, Notifier};
use boardclient::router::Navigation;
use boardclient::storage::FileStore;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("failed to read `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("invalid JSON output: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("no route matches `{0}`")]
    UnknownRoute(String),
    #[error("not logged in")]
    NotLoggedIn,
}

#[derive(Parser, Debug)]
#[command(name = "board", about = "Board forum API client")]
struct Cli {
    #[arg(long, env = "BOARD_API_BASE_URL")]
    base_url: Option<String>,

    #[arg(long, env = "BOARD_SESSION_FILE")]
    session_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login {
        #[arg(long)]
        username: String,
        #[arg(long, env = "BOARD_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "BOARD_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        display_name: Option<String>,
    },
    Logout,
    /// Show the stored user, or re-fetch it with `--refresh`.
    Whoami {
        #[arg(long, default_value_t = false)]
        refresh: bool,
    },
    /// Run the route guard for an app path and print where it lands.
    Open { path: String },
    Posts(PostsCommand),
    Comments(CommentsCommand),
    Files(FilesCommand),
    Admin(AdminCommand),
}

#[derive(Args, Debug)]
struct PostsCommand {
    #[command(subcommand)]
    command: PostsSubcommand,
}

#[derive(Subcommand, Debug)]
enum PostsSubcommand {
    List,
    Get {
        id: i64,
    },
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        content: String,
        #[arg(long)]
        category: Option<String>,
    },
    Update {
        id: i64,
        #[arg(long)]
        title: String,
        #[arg(long)]
        content: String,
        #[arg(long)]
        category: Option<String>,
    },
    Delete {
        id: i64,
    },
    Search {
        keyword: String,
        #[arg(long, default_value_t = SearchType::default())]
        search_type: SearchType,
    },
    View {
        id: i64,
    },
    Category {
        category: String,
    },
    Like {
        id: i64,
        #[arg(long = "type", default_value_t = LikeType::Like)]
        like_type: LikeType,
    },
    Sorted {
        #[arg(long, default_value_t = SortBy::default())]
        sort_by: SortBy,
        #[arg(long, default_value = ALL_CATEGORIES)]
        category: String,
    },
}

#[derive(Args, Debug)]
struct CommentsCommand {
    #[command(subcommand)]
    command: CommentsSubcommand,
}

#[derive(Subcommand, Debug)]
enum CommentsSubcommand {
    List {
        post_id: i64,
    },
    Create {
        post_id: i64,
        #[arg(long)]
        content: String,
    },
    Update {
        comment_id: i64,
        #[arg(long)]
        content: String,
    },
    Delete {
        comment_id: i64,
    },
    Count {
        post_id: i64,
    },
}

#[derive(Args, Debug)]
struct FilesCommand {
    #[command(subcommand)]
    command: FilesSubcommand,
}

#[derive(Subcommand, Debug)]
enum FilesSubcommand {
    Upload {
        post_id: i64,
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct AdminCommand {
    #[command(subcommand)]
    command: AdminSubcommand,
}

#[derive(Subcommand, Debug)]
enum AdminSubcommand {
    Users,
    Posts,
    Suspend {
        user_id: i64,
        #[arg(long)]
        days: u32,
        #[arg(long)]
        reason: String,
    },
    Unsuspend {
        user_id: i64,
    },
    Hide {
        post_id: i64,
        #[arg(long)]
        reason: String,
    },
    Unhide {
        post_id: i64,
    },
    DeletePost {
        post_id: i64,
    },
    Suspension {
        user_id: i64,
    },
}

/// Prints notices where the user will see them, next to the JSON output.
struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn notify(&self, notice: Notice) {
        tracing::debug!(%notice, "user notice");
        eprintln!("notice: {notice}");
    }
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    boardclient::logging::init();
    let cli = Cli::parse();

    let mut config = ClientConfig::from_env()?;
    if let Some(base_url) = &cli.base_url {
        config = config.with_base_url(base_url)?;
    }
    if let Some(session_file) = cli.session_file {
        config = config.with_session_file(session_file);
    }

    let storage = Arc::new(FileStore::new(config.session_file.clone()));
    let client = BoardClient::new(&config, storage, Arc::new(StderrNotifier))?;
    client.session.restore().await?;

    match cli.command {
        Command::Login { username, password } => {
            let response = client.session.login(&LoginRequest { username, password }).await?;
            eprintln!("signed in as {}", response.user.label());
            print_json(&response.user)
        }
        Command::Register { username, email, password, display_name } => {
            let request = RegisterRequest { username, email, password, display_name };
            let response = client.session.register(&request).await?;
            eprintln!("signed in as {}", response.user.label());
            print_json(&response.user)
        }
        Command::Logout => {
            client.session.logout().await?;
            println!("logged out");
            Ok(())
        }
        Command::Whoami { refresh } => {
            let user = if refresh {
                Some(client.session.refresh_current_user().await?)
            } else {
                client.session.user().await
            };
            print_json(&user.ok_or(CliError::NotLoggedIn)?)
        }
        Command::Open { path } => run_open(&client, &path).await,
        Command::Posts(posts) => run_posts(&client, posts).await,
        Command::Comments(comments) => run_comments(&client, comments).await,
        Command::Files(files) => run_files(&client, files).await,
        Command::Admin(admin) => run_admin(&client, admin).await,
    }
}

async fn run_open(client: &BoardClient, path: &str) -> Result<(), CliError> {
    match client.router.navigate(path).await {
        Navigation::Allow(matched) => {
            println!("{} {}", matched.route.name, client.history.current_path());
            Ok(())
        }
        Navigation::Redirect(target) => {
            println!("redirected to {target}");
            Ok(())
        }
        Navigation::NotFound => Err(CliError::UnknownRoute(path.to_owned())),
    }
}

async fn run_posts(client: &BoardClient, cmd: PostsCommand) -> Result<(), CliError> {
    let api = &client.api;
    match cmd.command {
        PostsSubcommand::List => print_json(&posts::list(api).await?),
        PostsSubcommand::Get { id } => print_json(&posts::get(api, id).await?),
        PostsSubcommand::Create { title, content, category } => {
            print_json(&posts::create(api, &PostRequest { title, content, category }).await?)
        }
        PostsSubcommand::Update { id, title, content, category } => {
            print_json(&posts::update(api, id, &PostRequest { title, content, category }).await?)
        }
        PostsSubcommand::Delete { id } => {
            posts::delete(api, id).await?;
            println!("deleted post {id}");
            Ok(())
        }
        PostsSubcommand::Search { keyword, search_type } => {
            print_json(&posts::search(api, &keyword, search_type).await?)
        }
        PostsSubcommand::View { id } => {
            posts::increment_view_count(api, id).await?;
            println!("ok");
            Ok(())
        }
        PostsSubcommand::Category { category } => print_json(&posts::by_category(api, &category).await?),
        PostsSubcommand::Like { id, like_type } => {
            posts::toggle_like(api, id, like_type).await?;
            println!("ok");
            Ok(())
        }
        PostsSubcommand::Sorted { sort_by, category } => print_json(&posts::sorted(api, sort_by, &category).await?),
    }
}

async fn run_comments(client: &BoardClient, cmd: CommentsCommand) -> Result<(), CliError> {
    let api = &client.api;
    match cmd.command {
        CommentsSubcommand::List { post_id } => print_json(&comments::for_post(api, post_id).await?),
        CommentsSubcommand::Create { post_id, content } => {
            print_json(&comments::create(api, post_id, &CommentRequest { content }).await?)
        }
        CommentsSubcommand::Update { comment_id, content } => {
            print_json(&comments::update(api, comment_id, &CommentRequest { content }).await?)
        }
        CommentsSubcommand::Delete { comment_id } => {
            comments::delete(api, comment_id).await?;
            println!("deleted comment {comment_id}");
            Ok(())
        }
        CommentsSubcommand::Count { post_id } => {
            println!("{}", comments::count(api, post_id).await?);
            Ok(())
        }
    }
}

async fn run_files(client: &BoardClient, cmd: FilesCommand) -> Result<(), CliError> {
    match cmd.command {
        FilesSubcommand::Upload { post_id, paths } => {
            let mut uploads = Vec::with_capacity(paths.len());
            for path in &paths {
                uploads.push(read_upload(path).await?);
            }
            print_json(&files::upload(&client.api, post_id, uploads).await?)
        }
    }
}

async fn run_admin(client: &BoardClient, cmd: AdminCommand) -> Result<(), CliError> {
    let api = &client.api;
    match cmd.command {
        AdminSubcommand::Users => print_json(&admin::users(api).await?),
        AdminSubcommand::Posts => print_json(&admin::posts(api).await?),
        AdminSubcommand::Suspend { user_id, days, reason } => {
            admin::suspend_user(api, user_id, days, &reason).await?;
            println!("suspended user {user_id} for {days} day(s)");
            Ok(())
        }
        AdminSubcommand::Unsuspend { user_id } => {
            admin::unsuspend_user(api, user_id).await?;
            println!("unsuspended user {user_id}");
            Ok(())
        }
        AdminSubcommand::Hide { post_id, reason } => {
            admin::hide_post(api, post_id, &reason).await?;
            println!("hid post {post_id}");
            Ok(())
        }
        AdminSubcommand::Unhide { post_id } => {
            admin::unhide_post(api, post_id).await?;
            println!("unhid post {post_id}");
            Ok(())
        }
        AdminSubcommand::DeletePost { post_id } => {
            admin::delete_post(api, post_id).await?;
            println!("deleted post {post_id}");
            Ok(())
        }
        AdminSubcommand::Suspension { user_id } => match admin::user_suspension(api, user_id).await? {
            Some(suspension) => print_json(&suspension),
            None => {
                println!("user {user_id} is not suspended");
                Ok(())
            }
        },
    }
}

async fn read_upload(path: &Path) -> Result<FileUpload, CliError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| CliError::ReadFile { path: path.to_owned(), source })?;
    let name = path
        .file_name()
        .map_or_else(|| path.display().to_string(), |name| name.to_string_lossy().into_owned());
    Ok(FileUpload::new(name, bytes))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
