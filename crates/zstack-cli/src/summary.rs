use console::Style;
use zstack_core::pipeline::config::PipelineConfig;
use zstack_core::pipeline::CompositeReport;

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    method: Style,
    path: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            method: Style::new().green(),
            path: Style::new().underlined(),
        }
    }
}

pub fn print_pipeline_summary(config: &PipelineConfig) {
    let s = Styles::new();
    let c = &config.composite;

    println!();
    println!("  {}", s.title.apply_to("Focus Stack"));
    println!("  {}", s.title.apply_to("\u{2550}".repeat(11)));
    println!();

    for input in &config.inputs {
        println!(
            "  {:<14}{}",
            s.label.apply_to("Input"),
            s.path.apply_to(input.display())
        );
    }
    println!(
        "  {:<14}{}",
        s.label.apply_to("Output"),
        s.path.apply_to(config.output.display())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Channels"),
        s.method.apply_to(if config.color { "RGB" } else { "mono" })
    );
    println!();

    println!("  {}", s.header.apply_to("Frame Selection"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Window"),
        s.value.apply_to(format!("{} frames", c.window_size))
    );
    println!();

    println!("  {}", s.header.apply_to("Fusion"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Depth"),
        s.value.apply_to(match c.pyramid_depth {
            Some(depth) => depth.to_string(),
            None => "auto".to_string(),
        })
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Kernel"),
        s.value.apply_to(format!("{0}x{0}", c.fusion_kernel_radius))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Bands"),
        s.method.apply_to(c.band_metric)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Base"),
        s.method.apply_to(c.base_fusion)
    );
    println!();
}

pub fn print_report(report: &CompositeReport) {
    let s = Styles::new();
    let best = report
        .scores
        .get(report.window.best)
        .map(|score| score.value)
        .unwrap_or(f64::NAN);

    println!();
    println!("  {}", s.header.apply_to("Result"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Sharpest"),
        s.value
            .apply_to(format!("frame {} ({best:.6})", report.window.best))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Window"),
        s.value.apply_to(format!(
            "frames {}..{} of {}",
            report.window.start,
            report.window.end,
            report.scores.len()
        ))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Levels"),
        s.value.apply_to(report.depth)
    );
}
