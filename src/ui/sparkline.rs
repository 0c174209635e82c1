//! Price sparkline for inline chart output

/// Block characters for different price levels (8 levels)
const BLOCKS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// A one-line sparkline over a price series
pub struct PriceSparkline<'a> {
    /// Prices for each plotted point
    prices: &'a [f64],
    /// Lowest price, mapped to the lowest block
    min: f64,
    /// Highest price, mapped to the tallest block
    max: f64,
}

impl<'a> PriceSparkline<'a> {
    pub fn new(prices: &'a [f64]) -> Self {
        let min = prices.iter().copied().fold(f64::INFINITY, f64::min);
        let max = prices.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Self { prices, min, max }
    }

    fn price_to_block(&self, price: f64) -> char {
        let range = self.max - self.min;
        if !range.is_finite() || range <= 0.0 {
            return BLOCKS[3];
        }
        let normalized = ((price - self.min) / range).clamp(0.0, 1.0);
        let index = ((normalized * 7.0).round() as usize).min(7);
        BLOCKS[index]
    }

    /// Renders at most `width` points
    pub fn render(&self, width: usize) -> String {
        self.prices
            .iter()
            .take(width)
            .map(|p| self.price_to_block(*p))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_to_block_extremes() {
        let prices = [10.0, 20.0];
        let sparkline = PriceSparkline::new(&prices);
        assert_eq!(sparkline.price_to_block(10.0), '▁');
        assert_eq!(sparkline.price_to_block(20.0), '█');
    }

    #[test]
    fn test_out_of_range_clamps() {
        let prices = [10.0, 20.0];
        let sparkline = PriceSparkline::new(&prices);
        assert_eq!(sparkline.price_to_block(50.0), '█');
        assert_eq!(sparkline.price_to_block(-1.0), '▁');
    }

    #[test]
    fn test_flat_series_uses_middle_block() {
        let prices = [5.0, 5.0, 5.0];
        assert_eq!(PriceSparkline::new(&prices).render(10), "▄▄▄");
    }

    #[test]
    fn test_render_respects_width() {
        let prices = [1.0, 2.0, 3.0, 4.0, 5.0];
        let line = PriceSparkline::new(&prices).render(3);
        assert_eq!(line.chars().count(), 3);
        assert!(line.starts_with('▁'));
    }

    #[test]
    fn test_empty_series_renders_nothing() {
        assert_eq!(PriceSparkline::new(&[]).render(10), "");
    }
}
