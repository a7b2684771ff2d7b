use glam::Vec2;

/// Axis-aligned rectangle, origin at the bottom-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Region {
    pub origin: Vec2,
    pub size: Vec2,
}

impl Region {
    #[must_use]
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            origin: Vec2::new(x, y),
            size: Vec2::new(w, h),
        }
    }

    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        let max = self.origin + self.size;
        point.cmpge(self.origin).all() && point.cmplt(max).all()
    }
}

/// Sprite component: an atlas texture and the source regions of its frames.
#[derive(Debug, Clone, Default)]
pub struct Sprite {
    /// Atlas identifier, resolved by the rendering backend.
    pub texture: Option<String>,
    frames: Vec<Region>,
    frame: usize,
    region: Region,
}

impl Sprite {
    #[must_use]
    pub fn new(texture: impl Into<String>, frames: Vec<Region>) -> Self {
        let region = frames.first().copied().unwrap_or_default();
        Self {
            texture: Some(texture.into()),
            frames,
            frame: 0,
            region,
        }
    }

    /// Current frame index.
    #[inline]
    #[must_use]
    pub fn frame(&self) -> usize {
        self.frame
    }

    #[inline]
    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Source region sampled from the atlas, valid after the node's last update step.
    #[inline]
    #[must_use]
    pub fn region(&self) -> Region {
        self.region
    }

    /// Refreshes the source region from `frame`. Out-of-range frames keep the
    /// previous region.
    pub fn update_region(&mut self, frame: usize) {
        if let Some(region) = self.frames.get(frame) {
            self.region = *region;
            self.frame = frame;
        }
    }
}

/// Frame-animation clock.
///
/// When a node carries both a `NodeFrame` and a [`Sprite`], the update pass
/// samples the sprite region from this clock's current frame.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeFrame {
    pub frame_count: usize,
    pub fps: f32,
    pub looping: bool,
    current: usize,
    elapsed: f32,
}

impl NodeFrame {
    #[must_use]
    pub fn new(frame_count: usize, fps: f32) -> Self {
        Self {
            frame_count,
            fps,
            looping: true,
            current: 0,
            elapsed: 0.0,
        }
    }

    #[inline]
    #[must_use]
    pub fn current(&self) -> usize {
        self.current
    }

    /// Advances the clock by `dt` seconds. Returns whether the frame changed.
    pub fn advance(&mut self, dt: f32) -> bool {
        if self.frame_count == 0 || self.fps <= 0.0 {
            return false;
        }
        self.elapsed += dt;
        let step = (self.elapsed * self.fps) as usize;
        let next = if self.looping {
            step % self.frame_count
        } else {
            step.min(self.frame_count - 1)
        };
        let changed = next != self.current;
        self.current = next;
        changed
    }

    pub fn rewind(&mut self) {
        self.current = 0;
        self.elapsed = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_region_ignores_out_of_range() {
        let mut sprite = Sprite::new(
            "atlas",
            vec![Region::new(0.0, 0.0, 16.0, 16.0), Region::new(16.0, 0.0, 16.0, 16.0)],
        );
        sprite.update_region(1);
        assert_eq!(sprite.region(), Region::new(16.0, 0.0, 16.0, 16.0));

        sprite.update_region(7);
        assert_eq!(sprite.frame(), 1);
        assert_eq!(sprite.region(), Region::new(16.0, 0.0, 16.0, 16.0));
    }

    #[test]
    fn test_frame_clock_loops_and_clamps() {
        let mut clock = NodeFrame::new(3, 10.0);
        assert!(clock.advance(0.1));
        assert_eq!(clock.current(), 1);
        assert!(!clock.advance(0.05));
        clock.advance(0.2);
        assert_eq!(clock.current(), 0);

        let mut once = NodeFrame::new(3, 10.0);
        once.looping = false;
        once.advance(5.0);
        assert_eq!(once.current(), 2);
    }
}
