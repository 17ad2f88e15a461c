//! Word-addressed local memory shared by the CPU program and its data.

use crate::ConfigError;

/// Bytes per bus word.
pub const WORD_BYTES: usize = 4;
/// Zeroed RAM words placed below the program image by default.
pub const DEFAULT_RAM_WORDS: usize = 256;
/// Byte address the CPU starts fetching from after reset.
pub const PROGADDR_RESET: u32 = 1024;
/// Byte address of the interrupt vector.
pub const PROGADDR_IRQ: u32 = PROGADDR_RESET + 0x10;

/// RAM followed by a firmware image, starting at address zero.
///
/// An address belongs to the memory when `address >> 2` indexes a word; the
/// low two address bits are ignored, as on the bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalMemory {
    words: Vec<u32>,
}

impl LocalMemory {
    /// Zeroed memory of `ram_words` words.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MemoryTooLarge`] when the words do not fit the
    /// 32-bit byte address space.
    pub fn new(ram_words: usize) -> Result<Self, ConfigError> {
        Self::with_image(ram_words, &[])
    }

    /// `ram_words` zeroed words followed by `image` as little-endian words.
    ///
    /// A trailing partial word is zero-padded; an image that already ends on
    /// a word boundary gets no extra zero word after it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MemoryTooLarge`] when the total does not fit the
    /// 32-bit byte address space.
    pub fn with_image(ram_words: usize, image: &[u8]) -> Result<Self, ConfigError> {
        let total = ram_words.saturating_add(image.len().div_ceil(WORD_BYTES));
        let max_words = (1_usize << 30).min(usize::MAX / WORD_BYTES);
        if total > max_words {
            return Err(ConfigError::MemoryTooLarge { words: total });
        }

        let mut words = vec![0; ram_words];
        words.extend(image.chunks(WORD_BYTES).map(|chunk| {
            let mut bytes = [0_u8; WORD_BYTES];
            bytes[..chunk.len()].copy_from_slice(chunk);
            u32::from_le_bytes(bytes)
        }));
        Ok(Self { words })
    }

    /// Size in words.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.words.len()
    }

    /// Whether the memory has no words.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Word index for a byte address inside the memory.
    #[must_use]
    pub fn word_index(&self, address: u32) -> Option<usize> {
        let index = usize::try_from(address >> 2).ok()?;
        (index < self.words.len()).then_some(index)
    }

    /// Whether `address` decodes to this memory.
    #[must_use]
    pub fn contains(&self, address: u32) -> bool {
        self.word_index(address).is_some()
    }

    /// Word at `address`; addresses outside the memory read as zero.
    #[must_use]
    pub fn read(&self, address: u32) -> u32 {
        self.word_index(address).map_or(0, |index| self.words[index])
    }

    /// Word by index; out-of-range indices read as zero.
    #[must_use]
    pub fn word(&self, index: usize) -> u32 {
        self.words.get(index).copied().unwrap_or(0)
    }

    /// Writes the byte lanes of `data` selected by `strobe` (bit `n` enables byte `n`).
    pub fn write_word(&mut self, index: usize, data: u32, strobe: u8) {
        if let Some(word) = self.words.get_mut(index) {
            *word = merge_bytes(*word, data, strobe);
        }
    }

    /// Byte-enable write at a byte address; addresses outside the memory are ignored.
    pub fn write(&mut self, address: u32, data: u32, strobe: u8) {
        if let Some(index) = self.word_index(address) {
            self.write_word(index, data, strobe);
        }
    }
}

/// Replaces the byte lanes of `old` selected by the low four bits of `strobe`.
#[must_use]
pub const fn merge_bytes(old: u32, data: u32, strobe: u8) -> u32 {
    let mut mask = 0_u32;
    let mut lane = 0;
    while lane < WORD_BYTES {
        if strobe & (1 << lane) != 0 {
            mask |= 0xFF << (lane * 8);
        }
        lane += 1;
    }
    (old & !mask) | (data & mask)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{merge_bytes, LocalMemory, DEFAULT_RAM_WORDS, PROGADDR_RESET};

    #[test]
    fn image_is_placed_after_ram_little_endian() {
        let memory =
            LocalMemory::with_image(DEFAULT_RAM_WORDS, &[0x13, 0x00, 0x00, 0x00, 0xAA, 0xBB])
                .expect("fits");
        assert_eq!(memory.len(), DEFAULT_RAM_WORDS + 2);
        assert_eq!(memory.read(PROGADDR_RESET), 0x0000_0013);
        assert_eq!(memory.read(PROGADDR_RESET + 4), 0x0000_BBAA);
    }

    #[rstest]
    #[case(0, 0)]
    #[case(1, 1)]
    #[case(3, 1)]
    #[case(4, 1)]
    #[case(8, 2)]
    fn image_pads_to_the_next_word_only(#[case] bytes: usize, #[case] words: usize) {
        let memory = LocalMemory::with_image(4, &vec![0xFF_u8; bytes]).expect("fits");
        assert_eq!(memory.len(), 4 + words);
    }

    #[test]
    fn containment_ignores_low_address_bits() {
        let memory = LocalMemory::new(4).expect("fits");
        assert!(memory.contains(0));
        assert!(memory.contains(15));
        assert!(!memory.contains(16));
        assert!(!memory.contains(0xF000_0000));
    }

    #[rstest]
    #[case(0b0000, 0x1122_3344)]
    #[case(0b0001, 0x1122_33DD)]
    #[case(0b0110, 0x11BB_CC44)]
    #[case(0b1000, 0xAA22_3344)]
    #[case(0b1111, 0xAABB_CCDD)]
    fn byte_enables_select_lanes(#[case] strobe: u8, #[case] expected: u32) {
        assert_eq!(merge_bytes(0x1122_3344, 0xAABB_CCDD, strobe), expected);
    }

    #[test]
    fn writes_outside_memory_are_dropped() {
        let mut memory = LocalMemory::new(2).expect("fits");
        memory.write(8, 0xFFFF_FFFF, 0xF);
        memory.write(4, 0x1234_5678, 0x3);
        assert_eq!(memory.read(4), 0x0000_5678);
        assert_eq!(memory.read(8), 0);
    }
}
