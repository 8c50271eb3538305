use std::path::PathBuf;

use anyhow::Context;
use pulseboard_client::{
    api::{
        ChangelogUpdate, FeedbackUpdate, NewChangelogEntry, NewComment, NewFeedback,
        NewRoadmapItem, RecordId, RoadmapUpdate, Time, VoterId,
    },
    Client, HttpRecordStore, LogNotifier, StoreConfig,
};

#[derive(structopt::StructOpt)]
struct Opt {
    /// Base url of the record store, overrides the config file
    #[structopt(short, long, env = "PULSEBOARD_URL")]
    host: Option<String>,

    /// Overrides the config file
    #[structopt(long, env = "PULSEBOARD_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// JSON file with `base_url`, `api_key` and optionally `max_retries`
    #[structopt(short, long, parse(from_os_str))]
    config: Option<PathBuf>,

    /// How many times to retry transient failures
    #[structopt(long)]
    retries: Option<u32>,

    #[structopt(subcommand)]
    cmd: Command,
}

#[derive(structopt::StructOpt)]
enum Command {
    /// User feedback, votes and comments
    Feedback(FeedbackCmd),
    /// Release notes
    Changelog(ChangelogCmd),
    /// Planned work
    Roadmap(RoadmapCmd),
}

#[derive(structopt::StructOpt)]
enum FeedbackCmd {
    List,
    Show {
        id: i64,
    },
    Create {
        title: String,
        #[structopt(long)]
        description: Option<String>,
        #[structopt(long)]
        category: Option<String>,
        #[structopt(long)]
        status: Option<String>,
    },
    Update {
        id: i64,
        #[structopt(long)]
        title: Option<String>,
        #[structopt(long)]
        description: Option<String>,
        #[structopt(long)]
        category: Option<String>,
        #[structopt(long)]
        status: Option<String>,
    },
    /// Set the status only
    Status {
        id: i64,
        status: String,
    },
    Delete {
        id: i64,
    },
    /// Toggle an upvote, replacing a downvote by the same voter
    Upvote {
        id: i64,
        voter: String,
        /// The voter id is stored as a number, not as text
        #[structopt(long)]
        numeric: bool,
    },
    /// Toggle a downvote, replacing an upvote by the same voter
    Downvote {
        id: i64,
        voter: String,
        /// The voter id is stored as a number, not as text
        #[structopt(long)]
        numeric: bool,
    },
    Comments {
        id: i64,
    },
    /// Add a comment
    Comment {
        id: i64,
        content: String,
        #[structopt(long)]
        author: Option<String>,
    },
}

#[derive(structopt::StructOpt)]
enum ChangelogCmd {
    List,
    Show {
        id: i64,
    },
    Create {
        title: String,
        #[structopt(long)]
        description: Option<String>,
        /// RFC 3339, defaults to now
        #[structopt(long)]
        release_date: Option<Time>,
        #[structopt(long = "type")]
        kind: Option<String>,
        #[structopt(long)]
        version: Option<String>,
    },
    Update {
        id: i64,
        #[structopt(long)]
        title: Option<String>,
        #[structopt(long)]
        description: Option<String>,
        #[structopt(long)]
        release_date: Option<Time>,
        #[structopt(long = "type")]
        kind: Option<String>,
        #[structopt(long)]
        version: Option<String>,
    },
    Delete {
        id: i64,
    },
    ByVersion {
        version: String,
    },
}

#[derive(structopt::StructOpt)]
enum RoadmapCmd {
    List,
    Show {
        id: i64,
    },
    Create {
        title: String,
        #[structopt(long)]
        description: Option<String>,
        #[structopt(long)]
        timeline: Option<String>,
        #[structopt(long)]
        status: Option<String>,
        #[structopt(long)]
        estimated_date: Option<String>,
        #[structopt(long, default_value = "0")]
        votes: i64,
        /// Feedback this item answers
        #[structopt(long = "link")]
        linked: Vec<i64>,
    },
    Update {
        id: i64,
        #[structopt(long)]
        title: Option<String>,
        #[structopt(long)]
        description: Option<String>,
        #[structopt(long)]
        timeline: Option<String>,
        #[structopt(long)]
        status: Option<String>,
        #[structopt(long)]
        estimated_date: Option<String>,
        #[structopt(long)]
        votes: Option<i64>,
        /// Replaces all links
        #[structopt(long = "link")]
        linked: Option<Vec<i64>>,
    },
    Delete {
        id: i64,
    },
    ByTimeline {
        timeline: String,
    },
}

fn store_config(opt: &Opt) -> anyhow::Result<StoreConfig> {
    let mut config = match &opt.config {
        Some(path) => StoreConfig::load(path)?,
        None => StoreConfig::new(
            opt.host
                .clone()
                .context("either --config or --host (PULSEBOARD_URL) is required")?,
            opt.api_key
                .clone()
                .context("either --config or --api-key (PULSEBOARD_API_KEY) is required")?,
        ),
    };
    if let Some(host) = &opt.host {
        config.base_url = host.clone();
    }
    if let Some(key) = &opt.api_key {
        config.api_key = key.clone();
    }
    if let Some(retries) = opt.retries {
        config.max_retries = retries;
    }
    Ok(config)
}

fn print(value: &impl serde::Serialize) -> anyhow::Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("serializing output")?
    );
    Ok(())
}

fn voter_id(raw: String, numeric: bool) -> anyhow::Result<VoterId> {
    match numeric {
        true => Ok(VoterId::from(
            raw.parse::<i64>()
                .with_context(|| format!("parsing voter id {raw:?} as a number"))?,
        )),
        false => Ok(VoterId::new(raw)),
    }
}

fn ids(raw: Vec<i64>) -> Vec<RecordId> {
    raw.into_iter().map(RecordId).collect()
}

async fn feedback(
    client: &Client<HttpRecordStore, LogNotifier>,
    cmd: FeedbackCmd,
) -> anyhow::Result<()> {
    let svc = client.feedback();
    match cmd {
        FeedbackCmd::List => print(&svc.list().await?),
        FeedbackCmd::Show { id } => print(&svc.get(RecordId(id)).await?),
        FeedbackCmd::Create {
            title,
            description,
            category,
            status,
        } => print(
            &svc.create(NewFeedback {
                title,
                description,
                category,
                status,
            })
            .await?,
        ),
        FeedbackCmd::Update {
            id,
            title,
            description,
            category,
            status,
        } => print(
            &svc.update(
                RecordId(id),
                FeedbackUpdate {
                    title,
                    description,
                    category,
                    status,
                },
            )
            .await?,
        ),
        FeedbackCmd::Status { id, status } => {
            print(&svc.update_status(RecordId(id), status).await?)
        }
        FeedbackCmd::Delete { id } => print(&svc.delete(RecordId(id)).await?),
        FeedbackCmd::Upvote { id, voter, numeric } => {
            print(&svc.upvote(RecordId(id), voter_id(voter, numeric)?).await?)
        }
        FeedbackCmd::Downvote { id, voter, numeric } => {
            print(&svc.downvote(RecordId(id), voter_id(voter, numeric)?).await?)
        }
        FeedbackCmd::Comments { id } => print(&svc.comments(RecordId(id)).await?),
        FeedbackCmd::Comment {
            id,
            content,
            author,
        } => print(
            &svc.add_comment(RecordId(id), NewComment { author, content })
                .await?,
        ),
    }
}

async fn changelog(
    client: &Client<HttpRecordStore, LogNotifier>,
    cmd: ChangelogCmd,
) -> anyhow::Result<()> {
    let svc = client.changelog();
    match cmd {
        ChangelogCmd::List => print(&svc.list().await?),
        ChangelogCmd::Show { id } => print(&svc.get(RecordId(id)).await?),
        ChangelogCmd::Create {
            title,
            description,
            release_date,
            kind,
            version,
        } => print(
            &svc.create(NewChangelogEntry {
                title,
                description,
                release_date,
                kind,
                version,
            })
            .await?,
        ),
        ChangelogCmd::Update {
            id,
            title,
            description,
            release_date,
            kind,
            version,
        } => print(
            &svc.update(
                RecordId(id),
                ChangelogUpdate {
                    title,
                    description,
                    release_date,
                    kind,
                    version,
                },
            )
            .await?,
        ),
        ChangelogCmd::Delete { id } => print(&svc.delete(RecordId(id)).await?),
        ChangelogCmd::ByVersion { version } => print(&svc.by_version(&version).await?),
    }
}

async fn roadmap(
    client: &Client<HttpRecordStore, LogNotifier>,
    cmd: RoadmapCmd,
) -> anyhow::Result<()> {
    let svc = client.roadmap();
    match cmd {
        RoadmapCmd::List => print(&svc.list().await?),
        RoadmapCmd::Show { id } => print(&svc.get(RecordId(id)).await?),
        RoadmapCmd::Create {
            title,
            description,
            timeline,
            status,
            estimated_date,
            votes,
            linked,
        } => print(
            &svc.create(NewRoadmapItem {
                title,
                description,
                timeline,
                status,
                estimated_date,
                votes,
                linked_feedback_ids: ids(linked),
            })
            .await?,
        ),
        RoadmapCmd::Update {
            id,
            title,
            description,
            timeline,
            status,
            estimated_date,
            votes,
            linked,
        } => print(
            &svc.update(
                RecordId(id),
                RoadmapUpdate {
                    title,
                    description,
                    timeline,
                    status,
                    estimated_date,
                    votes,
                    linked_feedback_ids: linked.map(ids),
                },
            )
            .await?,
        ),
        RoadmapCmd::Delete { id } => print(&svc.delete(RecordId(id)).await?),
        RoadmapCmd::ByTimeline { timeline } => print(&svc.by_timeline(&timeline).await?),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout is reserved for the JSON output
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let opt = <Opt as structopt::StructOpt>::from_args();
    let config = store_config(&opt)?;
    tracing::debug!(base_url = %config.base_url, "connecting to record store");
    let client = Client::new(HttpRecordStore::new(&config), LogNotifier);

    match opt.cmd {
        Command::Feedback(cmd) => feedback(&client, cmd).await,
        Command::Changelog(cmd) => changelog(&client, cmd).await,
        Command::Roadmap(cmd) => roadmap(&client, cmd).await,
    }
}
