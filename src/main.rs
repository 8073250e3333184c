use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use rs_face_verify::config::config::{
    FaceAttributeConfig, FaceDetectionConfig, FaceEmbeddingConfig,
};
use rs_face_verify::modules::face_attribute_client::FaceAttributeClient;
use rs_face_verify::modules::face_detection_client::FaceDetectionClient;
use rs_face_verify::pipeline::matcher::MatchCriteria;
use rs_face_verify::pipeline::pipeline::{VerificationPipeline, VerificationReport};

/// Compare the most prominent face of two images and report age, gender and
/// a MATCH/MISMATCH decision.
#[derive(Parser)]
#[command(name = "face-verify", version)]
struct Cli {
    /// First input image
    first: PathBuf,
    /// Second input image
    second: PathBuf,

    /// Face detector ONNX model
    #[arg(long)]
    detector_model: PathBuf,
    /// Face embedder ONNX model
    #[arg(long)]
    embedding_model: PathBuf,
    /// Age regressor ONNX model
    #[arg(long)]
    age_model: PathBuf,
    /// Gender classifier ONNX model
    #[arg(long)]
    gender_model: PathBuf,

    /// Minimum number of passing criteria required for a match (useful range 1-3)
    #[arg(long, default_value_t = 1)]
    min_votes: u32,
    /// Cosine similarity threshold
    #[arg(long, default_value_t = 0.4)]
    cos_thresh: f32,
    /// Euclidean distance threshold
    #[arg(long, default_value_t = 1.0)]
    eucl_thresh: f32,
    /// Angular distance threshold in degrees
    #[arg(long, default_value_t = 50.0)]
    angle_thresh: f32,

    /// Print the report as JSON instead of text
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let env_filter =
        EnvFilter::try_from_env("FACE_VERIFY_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    let pipeline = VerificationPipeline::new(
        FaceDetectionClient::new(
            &cli.detector_model,
            &cli.embedding_model,
            FaceDetectionConfig::default(),
            FaceEmbeddingConfig::default(),
        )?,
        FaceAttributeClient::new(&cli.age_model, FaceAttributeConfig::default())?,
        FaceAttributeClient::new(&cli.gender_model, FaceAttributeConfig::default())?,
    );

    let criteria = MatchCriteria {
        min_votes: cli.min_votes,
        cosine_threshold: cli.cos_thresh,
        euclidean_threshold: cli.eucl_thresh,
        angle_threshold: cli.angle_thresh,
    };

    let first = image::open(&cli.first)?;
    let second = image::open(&cli.second)?;
    let report = pipeline.verify(&first, &second, &criteria)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        render_text(&report, &criteria);
    }

    Ok(())
}

fn render_text(report: &VerificationReport, criteria: &MatchCriteria) {
    println!(
        "Face 1 -> Age: {}, Gender: {}",
        report.first.age, report.first.gender
    );
    println!(
        "Face 2 -> Age: {}, Gender: {}",
        report.second.age, report.second.gender
    );
    println!(
        "Cosine similarity:  {:.4} (> {})",
        report.matching.cosine_similarity, criteria.cosine_threshold
    );
    println!(
        "Euclidean distance: {:.4} (< {})",
        report.matching.euclidean_distance, criteria.euclidean_threshold
    );
    println!(
        "Angle:              {:.2} deg (< {})",
        report.matching.angular_distance, criteria.angle_threshold
    );
    println!(
        "Final: {} ({}/3 passed)",
        if report.matching.is_match {
            "MATCH"
        } else {
            "MISMATCH"
        },
        report.matching.votes
    );
}
