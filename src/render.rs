use std::fs;
use std::path::Path;
use log::{info, warn};
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use crate::errors::RenderError;
use crate::reshape::{AQI, CITY, FORECAST_COLUMNS, PM25_AVG};
use crate::table::Table;

pub const AQI_PLOT: &str = "aqi_plot.svg";
pub const PM25_FORECAST_PLOT: &str = "pm25_forecast_plot.svg";
pub const CORRELATION_PLOT: &str = "correlation_plot.svg";

const CHART_SIZE: (u32, u32) = (1000, 600);
const HEATMAP_SIZE: (u32, u32) = (1000, 800);
const SKY_BLUE: RGBColor = RGBColor(135, 206, 235);

/// Renders all three charts into the plot directory, each chart reading the table file
///
/// # Arguments
///
/// * 'table_file' - the reshaped CSV file
/// * 'plot_dir' - directory to write charts to, created if missing
pub fn plot_all(table_file: &str, plot_dir: &str) -> Result<(), RenderError> {
    fs::create_dir_all(plot_dir)?;
    let dir = Path::new(plot_dir);

    plot_aqi(table_file, &dir.join(AQI_PLOT))?;
    plot_pm25_forecast(table_file, &dir.join(PM25_FORECAST_PLOT))?;
    plot_correlation(table_file, &dir.join(CORRELATION_PLOT))?;

    Ok(())
}

/// Bar chart of AQI per city
///
/// # Arguments
///
/// * 'table_file' - the reshaped CSV file
/// * 'out' - chart file to write
pub fn plot_aqi(table_file: &str, out: &Path) -> Result<(), RenderError> {
    let table = Table::read_csv(table_file)?;
    if table.rows.is_empty() {
        warn!("no rows in {}, skipping AQI chart", table_file);
        return Ok(());
    }

    let data = aqi_per_city(&table)?;
    if data.is_empty() {
        warn!("no AQI values in {}, skipping AQI chart", table_file);
        return Ok(());
    }

    let n = data.len() as u32;
    let max = data.iter().map(|(_, v)| *v).fold(0.0, f64::max);
    let max = if max > 0.0 { max * 1.1 } else { 1.0 };

    let root = SVGBackend::new(out, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Air Quality Index (AQI) per City", ("sans-serif", 24))
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(60)
        .build_cartesian_2d((0u32..n).into_segmented(), 0.0..max)?;

    let city_of = |x: &SegmentValue<u32>| match x {
        SegmentValue::CenterOf(i) => data.get(*i as usize).map(|(c, _)| c.clone()).unwrap_or_default(),
        _ => String::new(),
    };
    chart.configure_mesh()
        .disable_x_mesh()
        .x_labels(data.len())
        .x_label_formatter(&city_of)
        .x_desc("Cities")
        .y_desc("AQI")
        .draw()?;

    chart.draw_series(
        Histogram::vertical(&chart)
            .style(SKY_BLUE.filled())
            .margin(10)
            .data(data.iter().enumerate().map(|(i, (_, v))| (i as u32, *v))),
    )?;

    root.present()?;
    info!("AQI chart saved as {}", out.display());

    Ok(())
}

/// Line chart of the PM2.5 average forecast per city over the forecast days
///
/// # Arguments
///
/// * 'table_file' - the reshaped CSV file
/// * 'out' - chart file to write
pub fn plot_pm25_forecast(table_file: &str, out: &Path) -> Result<(), RenderError> {
    let table = Table::read_csv(table_file)?;
    if table.rows.is_empty() {
        warn!("no rows in {}, skipping forecast chart", table_file);
        return Ok(());
    }

    let series = pm25_series(&table)?;
    if series.is_empty() {
        warn!("no PM2.5 forecast in {}, skipping forecast chart", table_file);
        return Ok(());
    }

    let days = series.iter().flat_map(|(_, p)| p.iter().map(|(d, _)| *d)).max().unwrap_or(0).max(1);
    let (lo, hi) = series
        .iter()
        .flat_map(|(_, p)| p.iter().map(|(_, v)| *v))
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    let pad = if hi - lo > 1e-6 { (hi - lo) * 0.1 } else { 1.0 };

    let root = SVGBackend::new(out, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("PM2.5 Forecast per City", ("sans-serif", 24))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(0f64..days as f64, (lo - pad)..(hi + pad))?;

    chart.configure_mesh()
        .x_labels(days + 1)
        .x_label_formatter(&|x| format!("{:.0}", x))
        .x_desc("Days (Index)")
        .y_desc("PM2.5 (µg/m³)")
        .draw()?;

    for (idx, (city, points)) in series.iter().enumerate() {
        let color = Palette99::pick(idx).to_rgba();
        chart.draw_series(LineSeries::new(points.iter().map(|(d, v)| (*d as f64, *v)), color))?
            .label(city.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
        chart.draw_series(points.iter().map(|(d, v)| Circle::new((*d as f64, *v), 4, color.filled())))?;
    }

    chart.configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    info!("PM2.5 forecast chart saved as {}", out.display());

    Ok(())
}

/// Heatmap of correlations between the measured numeric columns, forecasts excluded
///
/// # Arguments
///
/// * 'table_file' - the reshaped CSV file
/// * 'out' - chart file to write
pub fn plot_correlation(table_file: &str, out: &Path) -> Result<(), RenderError> {
    let table = Table::read_csv(table_file)?;
    let (labels, matrix) = correlation_matrix(&table);
    if labels.is_empty() {
        warn!("no numeric columns in {}, skipping correlation chart", table_file);
        return Ok(());
    }

    let n = labels.len() as u32;
    let root = SVGBackend::new(out, HEATMAP_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Correlation Between Real Air Quality Parameters", ("sans-serif", 24))
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(80)
        .build_cartesian_2d((0u32..n).into_segmented(), (0u32..n).into_segmented())?;

    // First column at the left, first row at the top
    let x_label = |x: &SegmentValue<u32>| match x {
        SegmentValue::CenterOf(i) => labels.get(*i as usize).cloned().unwrap_or_default(),
        _ => String::new(),
    };
    let y_label = |y: &SegmentValue<u32>| match y {
        SegmentValue::CenterOf(i) if *i < n => labels[(n - 1 - *i) as usize].clone(),
        _ => String::new(),
    };
    chart.configure_mesh()
        .disable_mesh()
        .x_labels(labels.len())
        .y_labels(labels.len())
        .x_label_formatter(&x_label)
        .y_label_formatter(&y_label)
        .draw()?;

    let cells = matrix
        .iter()
        .enumerate()
        .flat_map(|(i, row)| row.iter().enumerate().map(move |(j, c)| (i as u32, j as u32, *c)))
        .collect::<Vec<(u32, u32, Option<f64>)>>();

    chart.draw_series(cells.iter().map(|(i, j, c)| {
        let y = n - 1 - i;
        let color = c.map(coolwarm).unwrap_or(WHITE);
        Rectangle::new(
            [(SegmentValue::Exact(*j), SegmentValue::Exact(y)), (SegmentValue::Exact(j + 1), SegmentValue::Exact(y + 1))],
            color.filled(),
        )
    }))?;

    let annotation = TextStyle::from(("sans-serif", 14).into_font()).pos(Pos::new(HPos::Center, VPos::Center));
    chart.draw_series(cells.iter().filter_map(|(i, j, c)| {
        c.map(|c| Text::new(
            format!("{:.2}", c),
            (SegmentValue::CenterOf(*j), SegmentValue::CenterOf(n - 1 - i)),
            annotation.clone(),
        ))
    }))?;

    root.present()?;
    info!("correlation chart saved as {}", out.display());

    Ok(())
}

/// Returns AQI per distinct city in first seen order
///
/// # Arguments
///
/// * 'table' - the reshaped table
fn aqi_per_city(table: &Table) -> Result<Vec<(String, f64)>, RenderError> {
    let city_idx = required_column(table, CITY)?;
    let aqi = table.numeric_column(required_column(table, AQI)?)
        .ok_or(RenderError::from("AQI column is not numeric"))?;

    let mut result: Vec<(String, f64)> = Vec::new();
    for (city, value) in table.column(city_idx).zip(aqi) {
        if let (Some(city), Some(value)) = (city, value) {
            if !result.iter().any(|(c, _)| c == city) {
                result.push((city.to_string(), value));
            }
        }
    }

    Ok(result)
}

/// Returns per city the PM2.5 average forecast keyed by the city's forecast day index.
/// Cities with no values at all are left out.
///
/// # Arguments
///
/// * 'table' - the reshaped table
fn pm25_series(table: &Table) -> Result<Vec<(String, Vec<(usize, f64)>)>, RenderError> {
    let city_idx = required_column(table, CITY)?;
    let avg = table.numeric_column(required_column(table, PM25_AVG)?)
        .ok_or(RenderError::from("PM2.5 forecast column is not numeric"))?;

    let mut days: Vec<(String, Vec<Option<f64>>)> = Vec::new();
    for (city, value) in table.column(city_idx).zip(avg) {
        let city = city.unwrap_or_default();
        match days.iter_mut().find(|(c, _)| c == city) {
            Some((_, values)) => values.push(value),
            None => days.push((city.to_string(), vec![value])),
        }
    }

    Ok(days
        .into_iter()
        .filter(|(_, values)| values.iter().any(Option::is_some))
        .map(|(city, values)| {
            let points = values
                .into_iter()
                .enumerate()
                .filter_map(|(d, v)| v.map(|v| (d, v)))
                .collect();
            (city, points)
        })
        .collect())
}

/// Returns the labels and the pairwise Pearson correlation matrix of all numeric columns
/// except the forecast columns. Undefined coefficients are None.
///
/// # Arguments
///
/// * 'table' - the reshaped table
fn correlation_matrix(table: &Table) -> (Vec<String>, Vec<Vec<Option<f64>>>) {
    let columns = table.headers
        .iter()
        .enumerate()
        .filter(|(_, h)| !FORECAST_COLUMNS.contains(&h.as_str()))
        .filter_map(|(i, h)| table.numeric_column(i).map(|values| (h.clone(), values)))
        .collect::<Vec<(String, Vec<Option<f64>>)>>();

    let matrix = columns
        .iter()
        .map(|(_, a)| columns.iter().map(|(_, b)| pearson(a, b)).collect())
        .collect();

    (columns.into_iter().map(|(h, _)| h).collect(), matrix)
}

/// Pearson correlation over the positions where both series have a value
///
/// # Arguments
///
/// * 'a' - first series
/// * 'b' - second series
fn pearson(a: &[Option<f64>], b: &[Option<f64>]) -> Option<f64> {
    let pairs = a.iter()
        .zip(b)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .collect::<Vec<(f64, f64)>>();

    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (x, y) in &pairs {
        cov += (x - mean_x) * (y - mean_y);
        var_x += (x - mean_x).powi(2);
        var_y += (y - mean_y).powi(2);
    }

    if var_x == 0.0 || var_y == 0.0 {
        None
    } else {
        Some((cov / (var_x * var_y).sqrt()).clamp(-1.0, 1.0))
    }
}

/// Maps a coefficient in -1..1 onto a blue, grey, red scale
fn coolwarm(c: f64) -> RGBColor {
    const COOL: (f64, f64, f64) = (59.0, 76.0, 192.0);
    const MID: (f64, f64, f64) = (221.0, 221.0, 221.0);
    const WARM: (f64, f64, f64) = (180.0, 4.0, 38.0);

    let c = c.clamp(-1.0, 1.0);
    let (from, to, t) = if c < 0.0 { (COOL, MID, c + 1.0) } else { (MID, WARM, c) };
    let lerp = |a: f64, b: f64| (a + (b - a) * t).round() as u8;

    RGBColor(lerp(from.0, to.0), lerp(from.1, to.1), lerp(from.2, to.2))
}

fn required_column(table: &Table, name: &str) -> Result<usize, RenderError> {
    table.column_index(name).ok_or(RenderError(format!("column '{}' is missing", name)))
}
