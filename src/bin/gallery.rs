use std::error::Error;
use std::fs::create_dir_all;
use std::path::Path;

use acneviz::prelude::*;
use rand::{Rng, SeedableRng, rngs::StdRng};
use tracing::info;
use tracing_subscriber::EnvFilter;

const CONFIG_PATH: &str = "acneviz.toml";

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = VizConfig::load_or_default(CONFIG_PATH);
    let out_dir = Path::new(&config.export.output_dir);
    create_dir_all(out_dir)?;

    let mut rng = seeded_rng(0xAC4E);
    plot_network(out_dir, &config, &mut rng)?;
    plot_radar(out_dir, &config)?;
    plot_embedding(out_dir, &config, &mut rng)?;

    info!("Saved gallery to {}", out_dir.display());
    Ok(())
}

fn plot_network(out_dir: &Path, config: &VizConfig, rng: &mut StdRng) -> Result<(), Box<dyn Error>> {
    let labels = ["sleep", "stress", "diet", "sun", "sport", "skincare"];
    let n_obs = 200;

    // Two latent factors so some variables correlate strongly and others not at all.
    let factor_a: Vec<f64> = (0..n_obs).map(|_| rng.random_range(-1.0..1.0)).collect();
    let factor_b: Vec<f64> = (0..n_obs).map(|_| rng.random_range(-1.0..1.0)).collect();
    let loadings = [(0.9, 0.0), (0.7, 0.3), (0.0, 0.8), (0.2, 0.6), (0.5, 0.5), (0.0, 0.0)];

    let columns: Vec<Vec<f64>> = loadings
        .iter()
        .map(|&(la, lb)| {
            (0..n_obs)
                .map(|i| la * factor_a[i] + lb * factor_b[i] + 0.4 * rng.random_range(-1.0..1.0))
                .collect()
        })
        .collect();

    let mut matrix = CorrelationMatrix::pearson(labels.to_vec(), &columns)?.abs();
    // Exclude weak pairs so they render as missing edges.
    let n = labels.len();
    let mut rows: Vec<Vec<f64>> = (0..n)
        .map(|i| (0..n).map(|j| matrix.get(i, j).unwrap_or(f64::NAN)).collect())
        .collect();
    for row in rows.iter_mut() {
        for v in row.iter_mut() {
            if *v < 0.15 {
                *v = f64::NAN;
            }
        }
    }
    matrix = CorrelationMatrix::new(labels.to_vec(), rows);

    let plot = CorrelationNetworkGraph::new(&matrix, config.network.clone())?;
    plot.save(out_dir.join("network.png"), config.export.png)?;
    plot.save(
        out_dir.join("network_transparent.png"),
        config.export.png.transparent(),
    )?;

    let dark = NetworkStyle {
        theme: Some(Theme::Dark),
        ..config.network.clone()
    };
    CorrelationNetworkGraph::new(&matrix, dark)?
        .save(out_dir.join("network_dark.png"), config.export.png)?;
    Ok(())
}

fn plot_radar(out_dir: &Path, config: &VizConfig) -> Result<(), Box<dyn Error>> {
    let profiles = [
        ("cluster 1", [5.5, 2.0, 4.0, 6.0, 3.5]),
        ("cluster 2", [2.5, 6.5, 3.0, 2.0, 5.0]),
        ("cluster 3", [4.0, 4.0, 6.5, 3.0, 1.5]),
    ];
    let variables = ["sleep", "stress", "diet", "sun", "sport"];

    let records: Vec<RadarRecord> = profiles
        .iter()
        .flat_map(|(id, values)| {
            variables
                .iter()
                .zip(values)
                .map(move |(var, &v)| RadarRecord::new(*var, v).with_id(*id))
        })
        .collect();

    let style = RadarStyle {
        max_value: Some(7.0),
        legend_title: Some("Cluster".to_string()),
        ..config.radar.clone()
    };
    Radar::new(&records, style)?.save(out_dir.join("radar.png"), config.export.png)?;
    Ok(())
}

fn plot_embedding(out_dir: &Path, config: &VizConfig, rng: &mut StdRng) -> Result<(), Box<dyn Error>> {
    let centers = [(0.0, 0.0, 0.0), (4.0, 1.0, 2.0), (1.0, 4.0, -1.0)];
    let mut points = Vec::new();
    for (c, &(cx, cy, cz)) in centers.iter().enumerate() {
        for _ in 0..120 {
            points.push(
                EmbeddingPoint::new(
                    cx + rng.random_range(-1.0..1.0),
                    cy + rng.random_range(-1.0..1.0),
                    cz + rng.random_range(-1.0..1.0),
                )
                .with_id(format!("cluster {}", c + 1))
                .with_size(rng.random_range(0.5..2.0)),
            );
        }
    }

    let style = EmbeddingStyle {
        legend_title: Some("Cluster".to_string()),
        ..config.embedding.clone()
    };
    let plot = Embedding3D::new(&points, style)?;
    plot.save(out_dir.join("embedding.png"), config.export.png)?;

    let gif_style = EmbeddingStyle {
        width: 640,
        height: 480,
        ..plot.style().clone()
    };
    let gif_options = GifOptions {
        scale: 1.0,
        ..config.export.gif
    };
    Embedding3D::new(&points, gif_style)?.save_gif(out_dir.join("embedding.gif"), gif_options)?;
    Ok(())
}

fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}
