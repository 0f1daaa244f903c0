/// Screen rectangle for one bin, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bar {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Lays out one bar per bin in a `width` x `height` region.
///
/// Slot `i` starts at `floor(i * width / N)` and runs to the start of the next
/// slot, so bars tile the full width without gaps. A bar of value `v` is
/// `height * v` tall, clamped to the region.
pub fn layout(bins: &[f32], width: u32, height: u32) -> impl Iterator<Item = Bar> + '_ {
    let slot = width as f32 / bins.len().max(1) as f32;
    let h = height as f32;
    bins.iter().enumerate().map(move |(i, &v)| {
        let x = (i as f32 * slot) as u32;
        let next = ((i + 1) as f32 * slot) as u32;
        let top = (h - h * v).clamp(0.0, h) as u32;
        Bar {
            x,
            y: top,
            width: next.saturating_sub(x),
            height: height - top,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bars_tile_the_width() {
        let bins = vec![0.5f32; 7];
        let bars: Vec<Bar> = layout(&bins, 100, 40).collect();
        assert_eq!(bars[0].x, 0);
        for pair in bars.windows(2) {
            assert_eq!(pair[0].x + pair[0].width, pair[1].x);
        }
        let last = bars[6];
        assert_eq!(last.x + last.width, 100);
    }

    #[test]
    fn bar_height_follows_value() {
        let bins = [0.0f32, 0.25, 1.0, 1.5];
        let bars: Vec<Bar> = layout(&bins, 40, 200).collect();
        assert_eq!(bars[0].height, 0);
        assert_eq!(bars[1].height, 50);
        assert_eq!(bars[1].y, 150);
        assert_eq!(bars[2].height, 200);
        assert_eq!(bars[3].height, 200);
        assert_eq!(bars[3].y, 0);
    }

    #[test]
    fn narrow_region_gives_zero_width_slots() {
        let bins = vec![1.0f32; 256];
        let bars: Vec<Bar> = layout(&bins, 64, 10).collect();
        assert_eq!(bars.len(), 256);
        assert_eq!(bars.iter().map(|b| b.width).sum::<u32>(), 64);
        assert!(bars.iter().all(|b| b.x < 64));
    }
}
