//! Command-line value parsing.

use anyhow::{anyhow, bail, Context, Result};

use pipeline_core::{CriteriaWeights, Criterion, Position};

/// Parse `"lat,lon"` in decimal degrees, range-checked.
pub fn parse_position(value: &str) -> Result<Position> {
    let (lat, lon) = value
        .split_once(',')
        .ok_or_else(|| anyhow!("expected LAT,LON but got '{}'", value))?;
    let lat: f64 = lat.trim().parse().with_context(|| format!("invalid latitude '{}'", lat.trim()))?;
    let lon: f64 = lon.trim().parse().with_context(|| format!("invalid longitude '{}'", lon.trim()))?;

    let position = Position::new(lat, lon);
    position.validate()?;
    Ok(position)
}

/// Parse `"criterion=weight,..."`. Criteria left out carry no weight.
pub fn parse_weights(value: &str) -> Result<CriteriaWeights> {
    let mut weights = CriteriaWeights::empty();
    for pair in value.split(',').map(str::trim).filter(|pair| !pair.is_empty()) {
        let (name, weight) = pair
            .split_once('=')
            .ok_or_else(|| anyhow!("expected CRITERION=WEIGHT but got '{}'", pair))?;
        let criterion: Criterion = name.parse()?;
        if weights.contains(criterion) {
            bail!("criterion '{}' given twice", criterion);
        }
        let weight: f64 = weight
            .trim()
            .parse()
            .with_context(|| format!("invalid weight '{}' for {}", weight.trim(), criterion))?;
        weights.set(criterion, weight);
    }
    if weights.iter().next().is_none() {
        bail!("no criterion weights given");
    }
    weights.validate()?;
    Ok(weights)
}
