//! Owned raw sample buffers.

use crate::FrameInfo;
use crate::error::JpeglsError;
use crate::jpegls::traits::JpeglsSample;

/// Arrangement of the components of an [`Image`] in its buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleLayout {
    /// Component planes stored one after another; each plane has `height`
    /// lines of `stride` bytes.
    Planar,
    /// Pixels stored with all component samples adjacent; each line holds
    /// `width * component_count` samples within `stride` bytes.
    Interleaved,
}

/// A raw image: frame description, layout and sample bytes.
///
/// Samples use one byte when `bits_per_sample <= 8` and two little-endian
/// bytes otherwise. Two images are equal when their frame, layout and
/// samples are; stride padding is ignored.
#[derive(Debug, Clone)]
pub struct Image {
    frame_info: FrameInfo,
    layout: SampleLayout,
    stride: usize,
    data: Vec<u8>,
}

impl Image {
    /// Creates an image whose lines are packed without padding.
    pub fn new(frame_info: FrameInfo, layout: SampleLayout, data: Vec<u8>) -> Result<Self, JpeglsError> {
        frame_info.validate()?;
        Self::with_stride(frame_info, layout, Self::minimum_stride(&frame_info, layout), data)
    }

    /// Creates an image whose lines are `stride` bytes apart.
    pub fn with_stride(
        frame_info: FrameInfo,
        layout: SampleLayout,
        stride: usize,
        data: Vec<u8>,
    ) -> Result<Self, JpeglsError> {
        frame_info.validate()?;
        let minimum_stride = Self::minimum_stride(&frame_info, layout);
        if stride < minimum_stride {
            return Err(JpeglsError::InvalidStride);
        }

        let expected = stride * (Self::line_count(&frame_info, layout) - 1) + minimum_stride;
        if data.len() < expected {
            return Err(JpeglsError::InvalidBufferSize {
                expected,
                actual: data.len(),
            });
        }

        Ok(Self {
            frame_info,
            layout,
            stride,
            data,
        })
    }

    /// Creates an image with all samples set to zero.
    pub fn zeroed(frame_info: FrameInfo, layout: SampleLayout) -> Result<Self, JpeglsError> {
        frame_info.validate()?;
        let size = Self::minimum_stride(&frame_info, layout) * Self::line_count(&frame_info, layout);
        Self::new(frame_info, layout, vec![0; size])
    }

    /// Number of bytes of one packed line in the given layout.
    pub fn minimum_stride(frame_info: &FrameInfo, layout: SampleLayout) -> usize {
        let line = frame_info.width as usize * frame_info.bytes_per_sample();
        match layout {
            SampleLayout::Planar => line,
            SampleLayout::Interleaved => line * frame_info.component_count as usize,
        }
    }

    fn line_count(frame_info: &FrameInfo, layout: SampleLayout) -> usize {
        match layout {
            SampleLayout::Planar => frame_info.height as usize * frame_info.component_count as usize,
            SampleLayout::Interleaved => frame_info.height as usize,
        }
    }

    pub fn frame_info(&self) -> &FrameInfo {
        &self.frame_info
    }

    pub fn layout(&self) -> SampleLayout {
        self.layout
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    // Byte offset of the first sample of a line and the distance between
    // consecutive samples of that line.
    fn line_layout(&self, component: usize, y: usize) -> (usize, usize) {
        let bytes_per_sample = self.frame_info.bytes_per_sample();
        match self.layout {
            SampleLayout::Planar => ((component * self.frame_info.height as usize + y) * self.stride, bytes_per_sample),
            SampleLayout::Interleaved => (
                y * self.stride + component * bytes_per_sample,
                self.frame_info.component_count as usize * bytes_per_sample,
            ),
        }
    }

    /// Returns a sample. Panics when the position is outside the image.
    pub fn sample(&self, component: usize, x: usize, y: usize) -> u16 {
        assert!(x < self.frame_info.width as usize && component < self.frame_info.component_count as usize);
        let (base, step) = self.line_layout(component, y);
        if self.frame_info.bytes_per_sample() == 1 {
            u8::load(&self.data, base + x * step) as u16
        } else {
            u16::load(&self.data, base + x * step) as u16
        }
    }

    /// Sets a sample. Panics when the position is outside the image.
    pub fn set_sample(&mut self, component: usize, x: usize, y: usize, value: u16) {
        assert!(x < self.frame_info.width as usize && component < self.frame_info.component_count as usize);
        let (base, step) = self.line_layout(component, y);
        if self.frame_info.bytes_per_sample() == 1 {
            u8::store(&mut self.data, base + x * step, value as i32);
        } else {
            u16::store(&mut self.data, base + x * step, value as i32);
        }
    }

    pub(crate) fn read_line(&self, component: usize, y: usize, destination: &mut [i32]) {
        if self.frame_info.bytes_per_sample() == 1 {
            self.read_line_as::<u8>(component, y, destination);
        } else {
            self.read_line_as::<u16>(component, y, destination);
        }
    }

    fn read_line_as<T: JpeglsSample>(&self, component: usize, y: usize, destination: &mut [i32]) {
        let (base, step) = self.line_layout(component, y);
        for (x, sample) in destination.iter_mut().enumerate() {
            *sample = T::load(&self.data, base + x * step);
        }
    }

    pub(crate) fn write_line(&mut self, component: usize, y: usize, source: &[i32]) {
        if self.frame_info.bytes_per_sample() == 1 {
            self.write_line_as::<u8>(component, y, source);
        } else {
            self.write_line_as::<u16>(component, y, source);
        }
    }

    fn write_line_as<T: JpeglsSample>(&mut self, component: usize, y: usize, source: &[i32]) {
        let (base, step) = self.line_layout(component, y);
        for (x, &sample) in source.iter().enumerate() {
            T::store(&mut self.data, base + x * step, sample);
        }
    }

    /// Largest sample value over all components.
    pub fn max_sample_value(&self) -> u16 {
        let mut line = vec![0; self.frame_info.width as usize];
        let mut maximum = 0;
        for component in 0..self.frame_info.component_count as usize {
            for y in 0..self.frame_info.height as usize {
                self.read_line(component, y, &mut line);
                maximum = line.iter().fold(maximum, |m, &s| m.max(s));
            }
        }
        maximum as u16
    }

    /// Copies the samples into a packed image with the given layout.
    pub fn to_layout(&self, layout: SampleLayout) -> Image {
        self.convert(self.frame_info, layout)
    }

    pub fn into_layout(self, layout: SampleLayout) -> Image {
        if self.layout == layout && self.stride == Self::minimum_stride(&self.frame_info, layout) {
            return self;
        }
        self.to_layout(layout)
    }

    /// Returns a copy with the smallest bits per sample (at least 2) that
    /// still holds every sample, e.g. a 16-bit image whose values fit in a
    /// byte becomes an 8-bit image.
    pub fn narrow_to_fit(&self) -> Image {
        let maximum = self.max_sample_value() as u32;
        let bits_per_sample = (u32::BITS - maximum.leading_zeros()).max(2) as i32;
        if bits_per_sample >= self.frame_info.bits_per_sample {
            return self.clone();
        }

        log::debug!(
            "narrowing image from {} to {} bits per sample",
            self.frame_info.bits_per_sample,
            bits_per_sample
        );
        self.convert(
            FrameInfo {
                bits_per_sample,
                ..self.frame_info
            },
            self.layout,
        )
    }

    fn convert(&self, frame_info: FrameInfo, layout: SampleLayout) -> Image {
        let stride = Self::minimum_stride(&frame_info, layout);
        let mut target = Image {
            frame_info,
            layout,
            stride,
            data: vec![0; stride * Self::line_count(&frame_info, layout)],
        };

        let mut line = vec![0; frame_info.width as usize];
        for component in 0..frame_info.component_count as usize {
            for y in 0..frame_info.height as usize {
                self.read_line(component, y, &mut line);
                target.write_line(component, y, &line);
            }
        }
        target
    }
}

impl PartialEq for Image {
    fn eq(&self, other: &Self) -> bool {
        if self.frame_info != other.frame_info || self.layout != other.layout {
            return false;
        }

        let line_size = Self::minimum_stride(&self.frame_info, self.layout);
        (0..Self::line_count(&self.frame_info, self.layout)).all(|line| {
            self.data[line * self.stride..][..line_size] == other.data[line * other.stride..][..line_size]
        })
    }
}

impl Eq for Image {}
