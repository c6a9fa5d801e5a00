use nbis_cli::{Fingerprint, GrayImage, MatchStrength, Nbis, NbisConfig, utils};
use std::time::Instant;

/// Ridge grating with a few phase singularities, used when no image is given.
fn synthetic_print(size: usize, shift: f64) -> Result<GrayImage, Box<dyn std::error::Error>> {
    let singularities = [(0.3, 0.35, 1.0), (0.62, 0.3, -1.0), (0.45, 0.6, 1.0), (0.7, 0.72, -1.0)];
    let data = (0..size)
        .flat_map(|y| {
            (0..size).map(move |x| {
                let (xf, yf) = (x as f64, y as f64);
                let mut phase = 2.0 * std::f64::consts::PI * (0.8 * xf + 0.6 * yf + shift) / 9.0;
                for &(fx, fy, s) in &singularities {
                    phase += s * (yf - fy * size as f64).atan2(xf - fx * size as f64);
                }
                (128.0 + 100.0 * phase.cos()) as u8
            })
        })
        .collect();
    Ok(GrayImage::new(size, size, data)?)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("🖐️  Fingerprint Processing Showcase");
    println!("===================================\n");

    let engine = Nbis::new(NbisConfig::default())?;
    println!("⚙️  {}", engine.config().summary());

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (probe_img, gallery_img) = match args.as_slice() {
        [probe, gallery, ..] => (utils::load_fingerprint(probe)?, utils::load_fingerprint(gallery)?),
        [probe] => {
            let img = utils::load_fingerprint(probe)?;
            (img.clone(), img)
        }
        [] => (synthetic_print(320, 0.0)?, synthetic_print(320, 0.0)?),
    };
    let (w, h) = probe_img.dimensions();
    println!("📷 Probe image: {}x{}", w, h);

    // Showcase 1: minutiae extraction
    println!("\n🔍 Showcase 1: Minutiae Extraction");
    println!("----------------------------------");
    let start = Instant::now();
    let detection = engine.extract_minutiae(&probe_img, None)?;
    println!(
        "   • {} minutiae in {:.2?}",
        detection.minutiae.len(),
        start.elapsed()
    );
    for m in detection.minutiae.iter().take(5) {
        println!(
            "     ({:>3}, {:>3}) {:>3}° {:<11} reliability {:.2}",
            m.x,
            m.y,
            m.direction,
            m.kind.as_str(),
            m.reliability
        );
    }
    let maps = &detection.diagnostics.maps;
    println!(
        "   • Block maps {}x{} ({} px blocks), {} foreground blocks",
        maps.width,
        maps.height,
        maps.block_size,
        maps.foreground_blocks()
    );

    // Showcase 2: quality
    println!("\n📊 Showcase 2: Quality Assessment");
    println!("---------------------------------");
    let q = engine.compute_quality(&probe_img, None)?;
    println!("   • {}", q);
    println!("   • Status code: {}", q.return_code());

    // Showcase 3: matching through the object API
    println!("\n🤝 Showcase 3: Matching");
    println!("----------------------");
    let mut probe = Fingerprint::from_image(probe_img);
    let mut gallery = Fingerprint::from_image(gallery_img);
    let result = probe.match_with(&mut gallery, &engine, Some(40))?;
    println!("   • {}", result);
    println!("   • {}", MatchStrength::from_score(result.score).description());
    println!("   • {} vs {}", probe, gallery);

    let blank = Fingerprint::from_image(GrayImage::blank(w, h, 255)?);
    let blank_q = engine.compute_quality(blank.image(), None)?;
    println!("   • Blank image: {} (status {})", blank_q, blank_q.return_code());

    // Showcase 4: identification
    println!("\n🗂️  Showcase 4: 1:N Identification");
    println!("---------------------------------");
    let gallery_images: Vec<GrayImage> = (0..4)
        .map(|i| synthetic_print(w.max(h), i as f64 * 2.5))
        .collect::<Result<_, _>>()?;
    let start = Instant::now();
    let gallery_sets: Vec<_> = engine
        .extract_many(&gallery_images, None)
        .into_iter()
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .map(|d| d.minutiae)
        .collect();
    let ranked = engine.identify(&detection.minutiae, &gallery_sets, None)?;
    println!("   • Searched {} prints in {:.2?}", gallery_sets.len(), start.elapsed());
    for (rank, m) in ranked.iter().enumerate() {
        println!(
            "     #{} gallery {} score {} ({})",
            rank + 1,
            m.index,
            m.score,
            MatchStrength::from_score(m.score).confidence()
        );
    }

    // Showcase 5: overlay
    println!("\n🎨 Showcase 5: Visualization");
    println!("----------------------------");
    let overlay = utils::visualize_minutiae(probe.image(), &detection.minutiae, 6);
    overlay.save("minutiae_overlay.png")?;
    println!("   ✅ Saved minutiae_overlay.png");

    Ok(())
}
