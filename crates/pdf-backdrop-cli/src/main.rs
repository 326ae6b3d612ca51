use anyhow::{Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::warn;
use pdf_backdrop::fonts::StandardFont;
use pdf_backdrop::{
    BatchOptions, FontCatalog, MergeRequest, NumberMargins, NumberPosition, NumberingConfig,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "pdfb",
    about = "Place PDF pages onto a background template",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge a content PDF onto a background template
    Merge {
        /// Background template PDF
        #[arg(required_unless_present = "config")]
        background: Option<PathBuf>,

        /// Content PDF whose pages are placed on the backdrop
        #[arg(required_unless_present = "config")]
        content: Option<PathBuf>,

        /// Output PDF file
        #[arg(required_unless_present = "config")]
        output: Option<PathBuf>,

        /// Load the whole request from a JSON file instead
        #[arg(long, conflicts_with_all = ["background", "content", "output"])]
        config: Option<PathBuf>,

        /// Content size relative to the backdrop, in percent
        #[arg(long, default_value = "85")]
        scale: f32,

        /// Keep the first page of the content document
        #[arg(long)]
        keep_cover: bool,

        /// Append the content after the template without scaling
        #[arg(long)]
        append_only: bool,

        /// Delete the template file after a successful merge
        #[arg(long)]
        delete_template: bool,

        #[command(flatten)]
        numbering: NumberingArgs,
    },

    /// Merge every "Allegato <id>" PDF in a directory onto its cover
    Batch {
        /// Directory to scan
        directory: PathBuf,

        /// Load batch options from a JSON file instead
        #[arg(long)]
        config: Option<PathBuf>,

        /// Content size relative to the backdrop, in percent
        #[arg(long, default_value = "85")]
        scale: f32,

        /// Keep the first page of each annex
        #[arg(long)]
        keep_cover: bool,

        /// Subdirectory receiving the merged documents
        #[arg(long, default_value = "output")]
        output_subdir: String,

        #[command(flatten)]
        numbering: NumberingArgs,
    },
}

#[derive(Args)]
struct NumberingArgs {
    /// Stamp page numbers on the merged document
    #[arg(long)]
    number_pages: bool,

    /// Page number position
    #[arg(long, default_value = "bottom-right", value_enum)]
    number_position: PositionArg,

    /// Font name (a standard PDF font, or the display name of --font-file)
    #[arg(long, default_value = "Helvetica")]
    font: String,

    /// TrueType font file to embed
    #[arg(long)]
    font_file: Option<PathBuf>,

    /// Font size in points
    #[arg(long, default_value = "11")]
    font_size: f32,

    /// Margin in mm on all sides of the page number box
    #[arg(long, default_value = "10")]
    margin: f32,

    /// Top margin in mm (overrides --margin)
    #[arg(long)]
    margin_top: Option<f32>,

    /// Bottom margin in mm (overrides --margin)
    #[arg(long)]
    margin_bottom: Option<f32>,

    /// Left margin in mm (overrides --margin)
    #[arg(long)]
    margin_left: Option<f32>,

    /// Right margin in mm (overrides --margin)
    #[arg(long)]
    margin_right: Option<f32>,
}

#[derive(Clone, Copy, ValueEnum)]
enum PositionArg {
    TopLeft,
    TopCenter,
    TopRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

impl From<PositionArg> for NumberPosition {
    fn from(arg: PositionArg) -> Self {
        match arg {
            PositionArg::TopLeft => Self::TopLeft,
            PositionArg::TopCenter => Self::TopCenter,
            PositionArg::TopRight => Self::TopRight,
            PositionArg::BottomLeft => Self::BottomLeft,
            PositionArg::BottomCenter => Self::BottomCenter,
            PositionArg::BottomRight => Self::BottomRight,
        }
    }
}

impl NumberingArgs {
    fn into_config(self) -> Result<Option<NumberingConfig>> {
        if !self.number_pages {
            return Ok(None);
        }

        let mut catalog: FontCatalog = StandardFont::ALL
            .iter()
            .map(|font| (font.base_name().to_string(), None))
            .collect();
        if let Some(file) = self.font_file {
            catalog.insert(self.font.clone(), Some(file));
        }
        let (font, font_file) = pdf_backdrop::resolve_font_choice(&catalog, &self.font);
        if font != self.font {
            warn!("Unknown font {:?}, using {}", self.font, font);
        }

        let margins = NumberMargins {
            top_mm: self.margin_top.unwrap_or(self.margin),
            bottom_mm: self.margin_bottom.unwrap_or(self.margin),
            left_mm: self.margin_left.unwrap_or(self.margin),
            right_mm: self.margin_right.unwrap_or(self.margin),
        };

        Ok(Some(NumberingConfig::new(
            self.number_position.into(),
            font,
            font_file,
            self.font_size,
            margins,
        )?))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Merge {
            background,
            content,
            output,
            config,
            scale,
            keep_cover,
            append_only,
            delete_template,
            numbering,
        } => {
            let request = match (config, background, content, output) {
                (Some(config), ..) => MergeRequest::load(&config)?,
                (None, Some(background), Some(content), Some(output)) => {
                    let mut request = MergeRequest::new(background, content, output);
                    request.scale_percent = scale;
                    request.remove_first_content_page = !keep_cover;
                    request.append_only = append_only;
                    request.delete_background_after = delete_template;
                    request.numbering = numbering.into_config()?;
                    request
                }
                _ => bail!("background, content and output paths are required"),
            };

            let output = request.output_path.clone();
            tokio::task::spawn_blocking(move || pdf_backdrop::merge_documents(&request)).await??;
            println!("Merged → {}", output.display());
        }

        Commands::Batch {
            directory,
            config,
            scale,
            keep_cover,
            output_subdir,
            numbering,
        } => {
            let options = match config {
                Some(config) => BatchOptions::load(&config)?,
                None => BatchOptions {
                    scale_percent: scale,
                    remove_first_content_page: !keep_cover,
                    numbering: numbering.into_config()?,
                    output_subdir,
                    ..Default::default()
                },
            };

            let results =
                tokio::task::spawn_blocking(move || pdf_backdrop::process_batch(&directory, &options))
                    .await??;

            println!("Batch results:");
            for result in &results {
                let status = if result.success { "ok" } else { "FAILED" };
                println!(
                    "  [{}] Allegato {}: {}",
                    status, result.annex_id, result.message
                );
            }

            let failed = results.iter().filter(|r| !r.success).count();
            if failed > 0 {
                bail!("{} of {} annexes failed", failed, results.len());
            }
            println!("Processed {} annexes", results.len());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_every_argument_documented() {
        let cli = Cli::command();
        for subcommand in cli.get_subcommands() {
            for arg in subcommand.get_arguments() {
                assert!(
                    arg.get_help().is_some(),
                    "{} {} has no help text",
                    subcommand.get_name(),
                    arg.get_id()
                );
            }
        }
    }

    #[test]
    fn test_side_margins_override_uniform_margin() {
        let cli = Cli::try_parse_from([
            "pdfb",
            "merge",
            "bg.pdf",
            "content.pdf",
            "out.pdf",
            "--number-pages",
            "--margin",
            "8",
            "--margin-top",
            "3",
        ])
        .unwrap();

        let Commands::Merge { numbering, .. } = cli.command else {
            panic!("expected merge");
        };
        let config = numbering.into_config().unwrap().unwrap();
        assert_eq!(config.margins().top_mm, 3.0);
        assert_eq!(config.margins().bottom_mm, 8.0);
        assert_eq!(config.margins().left_mm, 8.0);
    }
}
