//! Dataset command - knowledge base management.

use anyhow::Result;
use clap::{Args, Subcommand, ValueEnum};
use console::Style;
use coze_client::{
    CreateDatasetRequest, DocumentFormatType, ListDatasetsQuery, UpdateDatasetRequest,
};

use super::{Context, print_done, print_header, print_json, truncate};

/// Arguments for the dataset command.
#[derive(Args, Debug)]
pub struct DatasetArgs {
    #[command(subcommand)]
    pub command: DatasetCommand,
}

/// Content format accepted on the command line.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum Format {
    Document,
    Table,
    Image,
}

impl From<Format> for DocumentFormatType {
    fn from(format: Format) -> Self {
        match format {
            Format::Document => DocumentFormatType::Document,
            Format::Table => DocumentFormatType::Table,
            Format::Image => DocumentFormatType::Image,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum DatasetCommand {
    /// Create a knowledge base
    Create {
        /// Space to create it in
        #[arg(short, long, env = "COZE_SPACE_ID")]
        space: String,

        /// Name
        name: String,

        /// Content format
        #[arg(short, long, value_enum, default_value = "document")]
        format: Format,

        /// Description
        #[arg(short, long)]
        description: Option<String>,
    },

    /// List knowledge bases of a space
    List {
        /// Space to list
        #[arg(short, long, env = "COZE_SPACE_ID")]
        space: String,

        /// Filter by name
        #[arg(long)]
        name: Option<String>,

        /// Filter by content format
        #[arg(short, long, value_enum)]
        format: Option<Format>,

        /// Page number
        #[arg(long, default_value = "1")]
        page: u32,

        /// Page size
        #[arg(long, default_value = "20")]
        size: u32,
    },

    /// Rename a knowledge base
    Update {
        /// Dataset ID
        id: String,

        /// New name
        name: String,

        /// New description
        #[arg(short, long)]
        description: Option<String>,
    },

    /// Delete a knowledge base
    Delete {
        /// Dataset ID
        id: String,
    },

    /// Show document processing progress
    Process {
        /// Dataset ID
        id: String,

        /// Documents to check
        #[arg(required = true)]
        documents: Vec<String>,
    },
}

/// Run the dataset command.
pub async fn run(args: DatasetArgs, ctx: &Context) -> Result<()> {
    let client = ctx.client()?;
    let datasets = client.datasets();
    let dim = Style::new().dim();

    match args.command {
        DatasetCommand::Create {
            space,
            name,
            format,
            description,
        } => {
            let created = datasets
                .create(&CreateDatasetRequest {
                    name,
                    space_id: space,
                    format_type: format.into(),
                    description,
                    file_id: None,
                })
                .await?;
            if ctx.json_output {
                print_json(&created)?;
            } else {
                print_done(format!("Dataset created: {}", created.dataset_id));
            }
        }
        DatasetCommand::List {
            space,
            name,
            format,
            page,
            size,
        } => {
            let list = datasets
                .list(&ListDatasetsQuery {
                    space_id: space,
                    name,
                    format_type: format.map(|f| i64::from(DocumentFormatType::from(f))),
                    page_num: Some(page),
                    page_size: Some(size),
                })
                .await?;
            if ctx.json_output {
                print_json(&list)?;
            } else {
                print_header("Datasets");
                if list.dataset_list.is_empty() {
                    println!("{}", dim.apply_to("No datasets found"));
                }
                for dataset in &list.dataset_list {
                    let format = match dataset.format() {
                        Some(DocumentFormatType::Document) => "document",
                        Some(DocumentFormatType::Table) => "table",
                        Some(DocumentFormatType::Image) => "image",
                        None => "unknown",
                    };
                    println!(
                        "{} {} {}",
                        dim.apply_to(format!("[{}]", dataset.dataset_id)),
                        truncate(&dataset.name, 40),
                        dim.apply_to(format!("({}, {} docs)", format, dataset.doc_count))
                    );
                }
                println!();
                println!("{}", dim.apply_to(format!("{} total", list.total_count)));
            }
        }
        DatasetCommand::Update {
            id,
            name,
            description,
        } => {
            datasets
                .update(
                    &id,
                    &UpdateDatasetRequest {
                        name,
                        description,
                        file_id: None,
                    },
                )
                .await?;
            print_done(format!("Dataset updated: {}", id));
        }
        DatasetCommand::Delete { id } => {
            datasets.delete(&id).await?;
            print_done(format!("Dataset deleted: {}", id));
        }
        DatasetCommand::Process { id, documents } => {
            let progress = datasets.process(&id, &documents).await?;
            if ctx.json_output {
                print_json(&progress)?;
            } else {
                print_header("Processing");
                for item in &progress {
                    let status = match item.status {
                        0 => Style::new().yellow().apply_to("processing"),
                        1 => Style::new().green().apply_to("done"),
                        9 => Style::new().red().apply_to("failed"),
                        _ => dim.apply_to("unknown"),
                    };
                    println!(
                        "{} {} {:>3}% {}",
                        dim.apply_to(format!("[{}]", item.document_id)),
                        truncate(&item.document_name, 40),
                        item.progress,
                        status
                    );
                }
            }
        }
    }

    Ok(())
}
