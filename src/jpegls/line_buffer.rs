/// Previous and current reconstructed lines for every lane of a scan.
///
/// Each lane line holds `width + 2` samples: slot 0 is the sample left of
/// column 0 and slot `width + 1` is the sample right of the last column, so
/// neighbour lookups never need bounds checks.
pub struct LineBuffer {
    width: usize,
    lane_count: usize,
    previous: Vec<i32>,
    current: Vec<i32>,
}

impl LineBuffer {
    pub fn new(width: usize, lane_count: usize) -> Self {
        let size = (width + 2) * lane_count;
        Self {
            width,
            lane_count,
            previous: vec![0; size],
            current: vec![0; size],
        }
    }

    /// Distance between the same column of two consecutive lanes.
    pub fn lane_stride(&self) -> usize {
        self.width + 2
    }

    /// Sets up the edge samples of a lane before its line is coded.
    pub fn start_lane(&mut self, lane: usize) {
        let base = lane * self.lane_stride();
        self.previous[base + self.width + 1] = self.previous[base + self.width];
        self.current[base] = self.previous[base + 1];
    }

    pub fn start_line(&mut self) {
        for lane in 0..self.lane_count {
            self.start_lane(lane);
        }
    }

    /// All lanes at once, for sample interleaved coding.
    pub fn lines_mut(&mut self) -> (&[i32], &mut [i32]) {
        (&self.previous, &mut self.current)
    }

    /// Samples of the current line of `lane`, without the edge slots.
    pub fn current_samples(&self, lane: usize) -> &[i32] {
        let start = lane * self.lane_stride() + 1;
        &self.current[start..start + self.width]
    }

    pub fn current_samples_mut(&mut self, lane: usize) -> &mut [i32] {
        let start = lane * self.lane_stride() + 1;
        &mut self.current[start..start + self.width]
    }

    pub fn end_line(&mut self) {
        std::mem::swap(&mut self.previous, &mut self.current);
    }

    /// Clears both lines; used at the start of every restart interval.
    pub fn reset(&mut self) {
        self.previous.fill(0);
        self.current.fill(0);
    }
}
