//! Document command - knowledge document management.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::{Args, Subcommand};
use console::Style;
use coze_client::{
    CreateDocumentsRequest, Document, DocumentBase, ListDocumentsRequest, UpdateDocumentRequest,
    UpdateRule,
};

use super::{Context, print_done, print_header, print_json, truncate};

/// Arguments for the document command.
#[derive(Args, Debug)]
pub struct DocumentArgs {
    #[command(subcommand)]
    pub command: DocumentCommand,
}

#[derive(Subcommand, Debug)]
pub enum DocumentCommand {
    /// Upload a local file into a knowledge base
    CreateFile {
        /// Dataset ID
        dataset: String,

        /// File to upload
        path: PathBuf,

        /// Document name (defaults to the file name)
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Add a web page to a knowledge base
    CreateWeb {
        /// Dataset ID
        dataset: String,

        /// Page URL
        url: String,

        /// Document name (defaults to the URL)
        #[arg(short, long)]
        name: Option<String>,

        /// Refresh the page every N hours
        #[arg(long)]
        refresh_hours: Option<u32>,
    },

    /// List documents of a knowledge base
    List {
        /// Dataset ID
        dataset: String,

        /// Page number
        #[arg(long, default_value = "1")]
        page: u32,

        /// Page size
        #[arg(long, default_value = "20")]
        size: u32,
    },

    /// Rename a document
    Update {
        /// Document ID
        id: String,

        /// New name
        #[arg(short, long)]
        name: Option<String>,

        /// Refresh every N hours (web pages only; 0 disables)
        #[arg(long)]
        refresh_hours: Option<u32>,
    },

    /// Delete documents
    Delete {
        /// Document IDs
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

/// Run the document command.
pub async fn run(args: DocumentArgs, ctx: &Context) -> Result<()> {
    let client = ctx.client()?;
    let documents = client.documents();

    match args.command {
        DocumentCommand::CreateFile {
            dataset,
            path,
            name,
        } => {
            let content = tokio::fs::read(&path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let file_type = path
                .extension()
                .and_then(|ext| ext.to_str())
                .unwrap_or("txt")
                .to_string();
            let name = name
                .or_else(|| path.file_name().map(|n| n.to_string_lossy().into_owned()))
                .unwrap_or_else(|| "document".to_string());

            let created = documents
                .create(&CreateDocumentsRequest {
                    dataset_id: dataset,
                    document_bases: vec![DocumentBase::local_file(name, &content, file_type)],
                    chunk_strategy: None,
                    format_type: None,
                })
                .await?;
            print_created(&created, ctx)?;
        }
        DocumentCommand::CreateWeb {
            dataset,
            url,
            name,
            refresh_hours,
        } => {
            let name = name.unwrap_or_else(|| url.clone());
            let created = documents
                .create(&CreateDocumentsRequest {
                    dataset_id: dataset,
                    document_bases: vec![DocumentBase::web_page(name, url, refresh_hours)],
                    chunk_strategy: None,
                    format_type: None,
                })
                .await?;
            print_created(&created, ctx)?;
        }
        DocumentCommand::List {
            dataset,
            page,
            size,
        } => {
            let list = documents
                .list(&ListDocumentsRequest {
                    dataset_id: dataset,
                    page: Some(page),
                    size: Some(size),
                })
                .await?;
            if ctx.json_output {
                print_json(&list)?;
            } else {
                let dim = Style::new().dim();
                print_header("Documents");
                if list.document_infos.is_empty() {
                    println!("{}", dim.apply_to("No documents found"));
                }
                for document in &list.document_infos {
                    print_document_line(document);
                }
                println!();
                println!("{}", dim.apply_to(format!("{} total", list.total)));
            }
        }
        DocumentCommand::Update {
            id,
            name,
            refresh_hours,
        } => {
            let update_rule =
                refresh_hours.map(|hours| UpdateRule::every(Some(hours).filter(|h| *h > 0)));
            documents
                .update(&UpdateDocumentRequest {
                    document_id: id.clone(),
                    document_name: name,
                    update_rule,
                })
                .await?;
            print_done(format!("Document updated: {}", id));
        }
        DocumentCommand::Delete { ids } => {
            documents.delete(&ids).await?;
            print_done(format!("Deleted {} document(s)", ids.len()));
        }
    }

    Ok(())
}

fn print_created(created: &[Document], ctx: &Context) -> Result<()> {
    if ctx.json_output {
        return print_json(created);
    }
    for document in created {
        print_done(format!("Document created: {}", document.document_id));
    }
    Ok(())
}

fn print_document_line(document: &Document) {
    let dim = Style::new().dim();
    let status = if document.is_completed() {
        Style::new().green().apply_to("done")
    } else if document.is_failed() {
        Style::new().red().apply_to("failed")
    } else if document.is_processing() {
        Style::new().yellow().apply_to("processing")
    } else {
        dim.apply_to("unknown")
    };
    println!(
        "{} {} {} {}",
        dim.apply_to(format!("[{}]", document.document_id)),
        truncate(&document.name, 40),
        dim.apply_to(format!("({} slices)", document.slice_count)),
        status
    );
}
