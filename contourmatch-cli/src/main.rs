use clap::{Parser, Subcommand};
use contourmatch::image::io::load_gray_image;
use contourmatch::{
    auto_generate, ContourMatchError, FinderConfig, FoundTemplate, ImageProcessor,
    ProcessorConfig, TemplateStore,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "ContourMatch CLI (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json", global = true)]
    config: PathBuf,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output for performance profiling.
    #[arg(long, global = true)]
    trace: bool,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Recognize shapes in the configured images.
    Recognize,
    /// Add one sample per labeled image to the template store.
    Learn,
    /// List the templates of the store.
    List,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct FinderConfigJson {
    max_rotate_angle_deg: f64,
    max_acf_descriptor_deviation: i32,
    min_acf: f64,
    min_icf: f64,
    check_acf: bool,
    check_icf: bool,
    min_scale: f64,
    /// `null` means unbounded.
    max_scale: Option<f64>,
    anti_pattern_name: String,
}

impl Default for FinderConfigJson {
    fn default() -> Self {
        let cfg = FinderConfig::default();
        Self {
            max_rotate_angle_deg: cfg.max_rotate_angle.to_degrees(),
            max_acf_descriptor_deviation: cfg.max_acf_descriptor_deviation,
            min_acf: cfg.min_acf,
            min_icf: cfg.min_icf,
            check_acf: cfg.check_acf,
            check_icf: cfg.check_icf,
            min_scale: cfg.min_scale,
            max_scale: cfg.max_scale.is_finite().then_some(cfg.max_scale),
            anti_pattern_name: cfg.anti_pattern_name,
        }
    }
}

impl From<FinderConfigJson> for FinderConfig {
    fn from(value: FinderConfigJson) -> Self {
        Self {
            max_rotate_angle: value.max_rotate_angle_deg.to_radians(),
            max_acf_descriptor_deviation: value.max_acf_descriptor_deviation,
            min_acf: value.min_acf,
            min_icf: value.min_icf,
            check_acf: value.check_acf,
            check_icf: value.check_icf,
            min_scale: value.min_scale,
            max_scale: value.max_scale.unwrap_or(f64::INFINITY),
            anti_pattern_name: value.anti_pattern_name,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct ProcessorConfigJson {
    equalize_hist: bool,
    blur: bool,
    blur_sigma: f32,
    noise_filter: bool,
    adaptive_threshold_block_size: u32,
    adaptive_threshold_parameter: f64,
    canny_threshold: f32,
    min_contour_area: f64,
    min_contour_length: usize,
    min_form_factor: f64,
    max_area_fraction: f64,
    filter_contours_by_size: bool,
    parallel: bool,
}

impl Default for ProcessorConfigJson {
    fn default() -> Self {
        let cfg = ProcessorConfig::default();
        Self {
            equalize_hist: cfg.equalize_hist,
            blur: cfg.blur,
            blur_sigma: cfg.blur_sigma,
            noise_filter: cfg.noise_filter,
            adaptive_threshold_block_size: cfg.adaptive_threshold_block_size,
            adaptive_threshold_parameter: cfg.adaptive_threshold_parameter,
            canny_threshold: cfg.canny_threshold,
            min_contour_area: cfg.min_contour_area,
            min_contour_length: cfg.min_contour_length,
            min_form_factor: cfg.min_form_factor,
            max_area_fraction: cfg.max_area_fraction,
            filter_contours_by_size: cfg.filter_contours_by_size,
            parallel: cfg.parallel,
        }
    }
}

impl ProcessorConfigJson {
    fn into_config(self, finder: FinderConfig) -> ProcessorConfig {
        ProcessorConfig {
            equalize_hist: self.equalize_hist,
            blur: self.blur,
            blur_sigma: self.blur_sigma,
            noise_filter: self.noise_filter,
            adaptive_threshold_block_size: self.adaptive_threshold_block_size,
            adaptive_threshold_parameter: self.adaptive_threshold_parameter,
            canny_threshold: self.canny_threshold,
            min_contour_area: self.min_contour_area,
            min_contour_length: self.min_contour_length,
            min_form_factor: self.min_form_factor,
            max_area_fraction: self.max_area_fraction,
            filter_contours_by_size: self.filter_contours_by_size,
            only_find_contours: false,
            parallel: self.parallel,
            finder,
        }
    }
}

#[derive(Debug, Deserialize)]
struct LabeledImage {
    label: String,
    image_path: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct Config {
    store_path: String,
    sample_count: usize,
    images: Vec<String>,
    samples: Vec<LabeledImage>,
    output_path: Option<String>,
    processor: ProcessorConfigJson,
    finder: FinderConfigJson,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_path: String::new(),
            sample_count: TemplateStore::new().sample_count(),
            images: Vec::new(),
            samples: Vec::new(),
            output_path: None,
            processor: ProcessorConfigJson::default(),
            finder: FinderConfigJson::default(),
        }
    }
}

#[derive(Debug, Serialize)]
struct FoundRecord {
    name: String,
    angle_deg: f64,
    scale: f64,
    rate: f64,
    acf_rate: f64,
    /// `[min_x, min_y, max_x, max_y]` of the recognized contour.
    bbox: [f64; 4],
}

impl From<&FoundTemplate> for FoundRecord {
    fn from(value: &FoundTemplate) -> Self {
        let b = value.sample.bounding_box();
        Self {
            name: value.name().to_owned(),
            angle_deg: value.angle_degrees(),
            scale: value.scale,
            rate: value.rate,
            acf_rate: value.acf_rate,
            bbox: [b.min_x, b.min_y, b.max_x, b.max_y],
        }
    }
}

#[derive(Debug, Serialize)]
struct ImageOutput {
    image: String,
    contours: usize,
    skipped: usize,
    found: Vec<FoundRecord>,
}

#[derive(Debug, Serialize)]
struct TemplateRecord {
    name: String,
    samples: usize,
    preferred_angle_no_more_90: bool,
    overlay_asset: bool,
}

#[derive(Debug, Serialize)]
struct LearnOutput {
    added: Vec<String>,
    skipped: Vec<String>,
    templates: usize,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive("contourmatch=info".parse()?),
            )
            .with_target(false)
            .init();
    }

    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }
    let Some(command) = cli.command else {
        return Err("a command is required: recognize, learn or list".into());
    };

    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;
    if config.store_path.is_empty() {
        return Err("store_path must be set in the config".into());
    }

    let (json, output_path) = match command {
        Command::Recognize => recognize(config)?,
        Command::Learn => learn(config)?,
        Command::List => list(&config)?,
    };
    match output_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    Ok(())
}

fn recognize(config: Config) -> Result<(String, Option<String>), Box<dyn std::error::Error>> {
    if config.images.is_empty() {
        return Err("images must list at least one file".into());
    }
    let store = TemplateStore::load_file(&config.store_path)?;
    let processor_cfg = config.processor.into_config(config.finder.into());
    let mut processor = ImageProcessor::with_store(processor_cfg, store)?;

    let mut outputs = Vec::with_capacity(config.images.len());
    for image_path in &config.images {
        let frame = load_gray_image(image_path)?;
        let pass = processor.process_gray(&frame)?;
        outputs.push(ImageOutput {
            image: image_path.clone(),
            contours: pass.contours.len(),
            skipped: pass.skipped,
            found: pass.found.iter().map(FoundRecord::from).collect(),
        });
    }
    Ok((serde_json::to_string_pretty(&outputs)?, config.output_path))
}

fn learn(config: Config) -> Result<(String, Option<String>), Box<dyn std::error::Error>> {
    if config.samples.is_empty() {
        return Err("samples must list at least one labeled image".into());
    }
    let mut store = load_or_create(Path::new(&config.store_path), config.sample_count)?;
    let processor_cfg = config.processor.into_config(config.finder.into());

    let mut labeled = Vec::with_capacity(config.samples.len());
    for sample in &config.samples {
        labeled.push((sample.label.clone(), load_gray_image(&sample.image_path)?));
    }
    let report = auto_generate(&mut store, &processor_cfg, labeled)?;
    store.save_file(&config.store_path)?;

    let output = LearnOutput {
        added: report.added,
        skipped: report.skipped,
        templates: store.len(),
    };
    Ok((serde_json::to_string_pretty(&output)?, config.output_path))
}

fn list(config: &Config) -> Result<(String, Option<String>), Box<dyn std::error::Error>> {
    let store = TemplateStore::load_file(&config.store_path)?;
    let records: Vec<TemplateRecord> = store
        .iter()
        .map(|t| TemplateRecord {
            name: t.name().to_owned(),
            samples: t.samples().len(),
            preferred_angle_no_more_90: t.preferred_angle_no_more_90(),
            overlay_asset: t.is_overlay_asset(),
        })
        .collect();
    Ok((
        serde_json::to_string_pretty(&records)?,
        config.output_path.clone(),
    ))
}

/// Opens the store, starting empty when the file is missing or unreadable.
///
/// An unreadable file is moved to `<path>.corrupt` first so that saving the
/// new store never destroys it.
fn load_or_create(
    path: &Path,
    sample_count: usize,
) -> Result<TemplateStore, Box<dyn std::error::Error>> {
    if !path.exists() {
        return Ok(TemplateStore::with_sample_count(sample_count)?);
    }
    match TemplateStore::load_file(path) {
        Ok(store) => Ok(store),
        Err(err @ ContourMatchError::CorruptStore { .. }) => {
            let backup = corrupt_backup_path(path);
            fs::rename(path, &backup)?;
            tracing::warn!(
                "{err}; moved {} to {} and starting with an empty store",
                path.display(),
                backup.display()
            );
            Ok(TemplateStore::with_sample_count(sample_count)?)
        }
        Err(err) => Err(err.into()),
    }
}

fn corrupt_backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".corrupt");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::{corrupt_backup_path, load_or_create};
    use contourmatch::{Contour, Point2, TemplateStore};
    use std::fs;
    use std::path::PathBuf;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir =
            std::env::temp_dir().join(format!("contourmatch-cli-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn corrupt_store_is_moved_aside() {
        let dir = scratch_dir("corrupt");
        let path = dir.join("templates.cmts");
        fs::write(&path, b"not a template store").unwrap();

        let store = load_or_create(&path, 30).unwrap();
        assert!(store.is_empty());
        assert!(!path.exists());
        assert_eq!(
            fs::read(corrupt_backup_path(&path)).unwrap(),
            b"not a template store"
        );
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn valid_store_is_loaded_in_place() {
        let dir = scratch_dir("valid");
        let path = dir.join("templates.cmts");
        let mut store = TemplateStore::new();
        let square = Contour::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(20.0, 0.0),
            Point2::new(20.0, 20.0),
            Point2::new(0.0, 20.0),
        ]);
        store.add_sample("square", &square).unwrap();
        store.save_file(&path).unwrap();

        let loaded = load_or_create(&path, 30).unwrap();
        assert_eq!(loaded.len(), 1);
        assert!(!corrupt_backup_path(&path).exists());
        fs::remove_dir_all(&dir).unwrap();
    }
}
