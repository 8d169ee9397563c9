//! ILI9341 Hardware Driver
//!
//! Async [`DisplaySink`] for a 320×240 ILI9341 TFT in landscape, 16-bit
//! RGB565 over SPI.
//!
//! # Wiring (RP2040 example)
//!
//! | Signal | RP2040 pin | Direction |
//! |--------|------------|-----------|
//! | SCK    | GP6 (SPI0 SCK) | Host → Display |
//! | MOSI   | GP7 (SPI0 TX)  | Host → Display |
//! | MISO   | GP4 (SPI0 RX)  | Display → Host |
//! | CS     | Managed by `SpiDevice` | Host → Display |
//! | DC     | GP1 (GPIO)     | Host → Display |
//!
//! Reset sequencing is left to the board bring-up code; [`Ili9341::init`]
//! assumes the controller is already out of reset.
//!
//! # Pixel format
//!
//! Pixels travel high byte first. [`WireColor`] already stores them in that
//! order, so tile data from the GPU is streamed without conversion.

use embedded_hal::digital::OutputPin;
use embedded_hal_async::{delay::DelayNs, spi::SpiDevice};

use platform::config::{BOOT_COLOR, DISPLAY_HEIGHT, DISPLAY_WIDTH};
use platform::{DisplayInfo, DisplaySink, WireColor};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Pixels sent per SPI write when streaming. 128 px = 256 bytes.
pub const CHUNK_PIXELS: usize = 128;

/// Settle time after `WakeUp` and after `DisplayOn`.
const POWER_SETTLE_MS: u32 = 200;

// ---------------------------------------------------------------------------
// Command enum
// ---------------------------------------------------------------------------

/// ILI9341 command codes used by this driver.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Sleep out — 0 data bytes; wait 120 ms+ before further commands.
    WakeUp = 0x11,
    /// Display on — 0 data bytes.
    DisplayOn = 0x29,
    /// Column address set — 4 data bytes (start, end; big-endian).
    SetColumnAddress = 0x2A,
    /// Page address set — 4 data bytes (start, end; big-endian).
    SetPageAddress = 0x2B,
    /// Memory write — pixel data follows.
    WriteMemory = 0x2C,
    /// Tearing effect line on — 1 data byte.
    TearingLineOn = 0x35,
    /// Memory access control (rotation / BGR) — 1 data byte.
    MemoryAccessControl = 0x36,
    /// Interface pixel format — 1 data byte.
    SetPixelFormat = 0x3A,
    /// Frame rate control (normal mode) — 2 data bytes.
    FrameRateControl = 0xB1,
    /// Display function control — 3 data bytes.
    DisplayFunctionControl = 0xB6,
    /// Power control 1 — 1 data byte.
    PowerControl1 = 0xC0,
    /// Power control 2 — 1 data byte.
    PowerControl2 = 0xC1,
    /// VCOM control 1 — 2 data bytes.
    VcomControl1 = 0xC5,
    /// VCOM control 2 — 1 data byte.
    VcomControl2 = 0xC7,
    /// Power control A — 5 data bytes.
    PowerControlA = 0xCB,
    /// Power control B — 3 data bytes.
    PowerControlB = 0xCF,
    /// Driver timing control A — 3 data bytes.
    DriverTimingControlA = 0xE8,
    /// Driver timing control B — 2 data bytes.
    DriverTimingControlB = 0xEA,
    /// Power on sequence control — 4 data bytes.
    PowerOnSequence = 0xED,
    /// Pump ratio control — 1 data byte.
    PumpRatioControl = 0xF7,
}

/// Register writes issued by [`Ili9341::init`], in order.
///
/// Each entry is a command byte and its parameters.
pub const INIT_SEQUENCE: &[(u8, &[u8])] = &[
    // Undocumented; part of the vendor reference init.
    (0xEF, &[0x03, 0x80, 0x02]),
    (Command::PowerControlB as u8, &[0x00, 0xC1, 0x30]),
    (Command::PowerOnSequence as u8, &[0x64, 0x03, 0x12, 0x81]),
    (Command::DriverTimingControlA as u8, &[0x85, 0x00, 0x78]),
    (Command::PowerControlA as u8, &[0x39, 0x2C, 0x00, 0x34, 0x02]),
    (Command::PumpRatioControl as u8, &[0x20]),
    (Command::DriverTimingControlB as u8, &[0x00, 0x00]),
    (Command::PowerControl1 as u8, &[0x23]),
    (Command::PowerControl2 as u8, &[0x10]),
    (Command::VcomControl1 as u8, &[0x3E, 0x28]),
    (Command::VcomControl2 as u8, &[0x86]),
    (Command::DisplayFunctionControl as u8, &[0x08, 0x82, 0x27]),
    // V-blank only.
    (Command::TearingLineOn as u8, &[0x00]),
    // Landscape, BGR.
    (Command::MemoryAccessControl as u8, &[0xE8]),
    // 16 bits per pixel.
    (Command::SetPixelFormat as u8, &[0x55]),
    // 70 Hz.
    (Command::FrameRateControl as u8, &[0x00, 0x1B]),
];

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors returned by the ILI9341 driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SinkError {
    /// SPI communication error.
    Communication,
    /// GPIO operation error.
    Gpio,
    /// Pixel data length does not match the requested window.
    InvalidBuffer,
    /// Window extends past the panel.
    InvalidCoordinate,
}

impl core::fmt::Display for SinkError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Communication => write!(f, "SPI communication error"),
            Self::Gpio => write!(f, "GPIO error"),
            Self::InvalidBuffer => write!(f, "Invalid buffer size"),
            Self::InvalidCoordinate => write!(f, "Coordinate out of bounds"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for SinkError {}

// ---------------------------------------------------------------------------
// Driver struct
// ---------------------------------------------------------------------------

/// ILI9341 display driver.
///
/// Generic over:
/// - `SPI` — an async [`SpiDevice`] (manages CS).
/// - `DC`  — Data/Command [`OutputPin`].
/// - `DELAY` — [`DelayNs`] for the power-up settle times.
///
/// On hardware supply `embassy_time::Delay`; in host tests
/// `embedded_hal_mock::eh1::delay::NoopDelay`.
pub struct Ili9341<SPI, DC, DELAY> {
    spi: SPI,
    dc: DC,
    delay: DELAY,
}

impl<SPI, DC, DELAY> Ili9341<SPI, DC, DELAY>
where
    SPI: SpiDevice,
    DC: OutputPin,
    DELAY: DelayNs,
{
    /// Create a driver. Nothing is sent until [`DisplaySink::init`].
    pub fn new(spi: SPI, dc: DC, delay: DELAY) -> Self {
        Self { spi, dc, delay }
    }

    /// Give back the bus, pin and delay.
    pub fn release(self) -> (SPI, DC, DELAY) {
        (self.spi, self.dc, self.delay)
    }

    // -----------------------------------------------------------------------
    // Low-level SPI helpers
    // -----------------------------------------------------------------------

    /// Assert DC low (command mode) and send one command byte.
    async fn send_command(&mut self, cmd: u8) -> Result<(), SinkError> {
        self.dc.set_low().map_err(|_| SinkError::Gpio)?;
        self.spi
            .write(&[cmd])
            .await
            .map_err(|_| SinkError::Communication)
    }

    /// Assert DC high (data mode) and send bytes.
    async fn send_data(&mut self, data: &[u8]) -> Result<(), SinkError> {
        if data.is_empty() {
            return Ok(());
        }
        self.dc.set_high().map_err(|_| SinkError::Gpio)?;
        self.spi
            .write(data)
            .await
            .map_err(|_| SinkError::Communication)
    }

    /// Send one command followed by its parameters.
    async fn cmd_data(&mut self, cmd: u8, data: &[u8]) -> Result<(), SinkError> {
        self.send_command(cmd).await?;
        self.send_data(data).await
    }

    // -----------------------------------------------------------------------
    // Window helpers
    // -----------------------------------------------------------------------

    /// Check a `w` × `h` window at (`x`, `y`) and return its inclusive end corner.
    fn window_end(x: u16, y: u16, w: u16, h: u16) -> Result<(u16, u16), SinkError> {
        if w == 0 || h == 0 {
            return Err(SinkError::InvalidCoordinate);
        }
        let x1 = x.checked_add(w - 1).ok_or(SinkError::InvalidCoordinate)?;
        let y1 = y.checked_add(h - 1).ok_or(SinkError::InvalidCoordinate)?;
        if x1 >= DISPLAY_WIDTH || y1 >= DISPLAY_HEIGHT {
            return Err(SinkError::InvalidCoordinate);
        }
        Ok((x1, y1))
    }

    /// Restrict memory writes to the inclusive window (`x0`, `y0`)–(`x1`, `y1`).
    async fn set_address(&mut self, x0: u16, y0: u16, x1: u16, y1: u16) -> Result<(), SinkError> {
        let [x0h, x0l] = x0.to_be_bytes();
        let [x1h, x1l] = x1.to_be_bytes();
        let [y0h, y0l] = y0.to_be_bytes();
        let [y1h, y1l] = y1.to_be_bytes();
        self.cmd_data(Command::SetColumnAddress as u8, &[x0h, x0l, x1h, x1l])
            .await?;
        self.cmd_data(Command::SetPageAddress as u8, &[y0h, y0l, y1h, y1l])
            .await
    }

    /// Stream pixels in [`CHUNK_PIXELS`]-sized writes.
    async fn write_pixels(&mut self, pixels: &[WireColor]) -> Result<(), SinkError> {
        let mut buf = [0u8; CHUNK_PIXELS * 2];
        for chunk in pixels.chunks(CHUNK_PIXELS) {
            for (dst, color) in buf.chunks_exact_mut(2).zip(chunk) {
                dst.copy_from_slice(&color.to_bytes());
            }
            let len = chunk.len() * 2;
            let bytes = buf.get(..len).ok_or(SinkError::InvalidBuffer)?;
            self.send_data(bytes).await?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// platform::DisplaySink implementation
// ---------------------------------------------------------------------------

impl<SPI, DC, DELAY> DisplaySink for Ili9341<SPI, DC, DELAY>
where
    SPI: SpiDevice,
    DC: OutputPin,
    DELAY: DelayNs,
{
    type Error = SinkError;

    fn info(&self) -> DisplayInfo {
        DisplayInfo {
            width: DISPLAY_WIDTH,
            height: DISPLAY_HEIGHT,
        }
    }

    /// Run [`INIT_SEQUENCE`], paint the boot color, then wake the panel and
    /// turn it on.
    async fn init(&mut self) -> Result<(), Self::Error> {
        #[cfg(feature = "defmt")]
        defmt::info!("Initialising ILI9341 ({=u16}x{=u16})", DISPLAY_WIDTH, DISPLAY_HEIGHT);

        for &(cmd, params) in INIT_SEQUENCE {
            self.cmd_data(cmd, params).await?;
        }

        self.clear(WireColor::from_raw(BOOT_COLOR)).await?;

        self.send_command(Command::WakeUp as u8).await?;
        self.delay.delay_ms(POWER_SETTLE_MS).await;
        self.send_command(Command::DisplayOn as u8).await?;
        self.delay.delay_ms(POWER_SETTLE_MS).await;

        #[cfg(feature = "defmt")]
        defmt::info!("ILI9341 initialisation complete");
        Ok(())
    }

    /// Fill the panel with one color.
    async fn clear(&mut self, color: WireColor) -> Result<(), Self::Error> {
        self.set_address(0, 0, DISPLAY_WIDTH - 1, DISPLAY_HEIGHT - 1)
            .await?;
        self.send_command(Command::WriteMemory as u8).await?;

        let row = [color; CHUNK_PIXELS];
        let total = usize::from(DISPLAY_WIDTH) * usize::from(DISPLAY_HEIGHT);
        let mut sent = 0;
        while sent < total {
            let n = CHUNK_PIXELS.min(total - sent);
            let pixels = row.get(..n).ok_or(SinkError::InvalidBuffer)?;
            self.write_pixels(pixels).await?;
            sent += n;
        }
        Ok(())
    }

    async fn set_pixel(&mut self, x: u16, y: u16, color: WireColor) -> Result<(), Self::Error> {
        Self::window_end(x, y, 1, 1)?;
        self.set_address(x, y, x, y).await?;
        self.send_command(Command::WriteMemory as u8).await?;
        self.send_data(&color.to_bytes()).await
    }

    /// Write a `w` × `h` block. `data` must hold exactly `w * h` pixels.
    async fn blit(
        &mut self,
        x: u16,
        y: u16,
        w: u16,
        h: u16,
        data: &[WireColor],
    ) -> Result<(), Self::Error> {
        if data.len() != usize::from(w) * usize::from(h) {
            return Err(SinkError::InvalidBuffer);
        }
        let (x1, y1) = Self::window_end(x, y, w, h)?;
        self.set_address(x, y, x1, y1).await?;
        self.send_command(Command::WriteMemory as u8).await?;
        self.write_pixels(data).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    use embedded_hal_mock::eh1::delay::NoopDelay;
    use embedded_hal_mock::eh1::digital::{
        Mock as PinMock, State as PinState, Transaction as PinTransaction,
    };
    use embedded_hal_mock::eh1::spi::{Mock as SpiMock, Transaction as SpiTransaction};

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    /// The three SPI expectations produced by one `SpiDevice::write`:
    /// TransactionStart + Write(data) + TransactionEnd.
    fn spi_device_write(data: &[u8]) -> [SpiTransaction<u8>; 3] {
        [
            SpiTransaction::transaction_start(),
            SpiTransaction::write_vec(data.to_vec()),
            SpiTransaction::transaction_end(),
        ]
    }

    /// Accumulates matching SPI and DC expectations.
    #[derive(Default)]
    struct Expect {
        spi: Vec<SpiTransaction<u8>>,
        dc: Vec<PinTransaction>,
    }

    impl Expect {
        fn command(&mut self, cmd: u8) -> &mut Self {
            self.dc.push(PinTransaction::set(PinState::Low));
            self.spi.extend(spi_device_write(&[cmd]));
            self
        }

        fn data(&mut self, data: &[u8]) -> &mut Self {
            if !data.is_empty() {
                self.dc.push(PinTransaction::set(PinState::High));
                self.spi.extend(spi_device_write(data));
            }
            self
        }

        fn window(&mut self, x0: u16, y0: u16, x1: u16, y1: u16) -> &mut Self {
            let col = [x0.to_be_bytes(), x1.to_be_bytes()].concat();
            let page = [y0.to_be_bytes(), y1.to_be_bytes()].concat();
            self.command(Command::SetColumnAddress as u8)
                .data(&col)
                .command(Command::SetPageAddress as u8)
                .data(&page)
        }

        fn pixels(&mut self, pixels: &[WireColor]) -> &mut Self {
            for chunk in pixels.chunks(CHUNK_PIXELS) {
                let bytes: Vec<u8> = chunk.iter().flat_map(|c| c.to_bytes()).collect();
                self.data(&bytes);
            }
            self
        }

        fn clear(&mut self, color: WireColor) -> &mut Self {
            self.window(0, 0, 319, 239)
                .command(Command::WriteMemory as u8);
            let total = 320 * 240;
            let pixels = vec![color; CHUNK_PIXELS];
            for _ in 0..total / CHUNK_PIXELS {
                self.pixels(&pixels);
            }
            self
        }

        fn driver(&self) -> (Ili9341<SpiMock<u8>, PinMock, NoopDelay>, SpiMock<u8>, PinMock) {
            let spi = SpiMock::new(&self.spi);
            let dc = PinMock::new(&self.dc);
            (Ili9341::new(spi.clone(), dc.clone(), NoopDelay), spi, dc)
        }
    }

    // -----------------------------------------------------------------------
    // Tests
    // -----------------------------------------------------------------------

    #[test]
    fn test_init_sequence_table() {
        assert_eq!(INIT_SEQUENCE.len(), 16);
        assert_eq!(INIT_SEQUENCE[0], (0xEF, &[0x03, 0x80, 0x02][..]));
        // 16-bit pixels, landscape.
        assert!(INIT_SEQUENCE.contains(&(0x3A, &[0x55][..])));
        assert!(INIT_SEQUENCE.contains(&(0x36, &[0xE8][..])));
    }

    #[test]
    fn test_every_command_is_sent() {
        // Sent at runtime rather than from the table.
        let runtime = [
            Command::WakeUp,
            Command::DisplayOn,
            Command::SetColumnAddress,
            Command::SetPageAddress,
            Command::WriteMemory,
        ];
        let table = [
            Command::TearingLineOn,
            Command::MemoryAccessControl,
            Command::SetPixelFormat,
            Command::FrameRateControl,
            Command::DisplayFunctionControl,
            Command::PowerControl1,
            Command::PowerControl2,
            Command::VcomControl1,
            Command::VcomControl2,
            Command::PowerControlA,
            Command::PowerControlB,
            Command::DriverTimingControlA,
            Command::DriverTimingControlB,
            Command::PowerOnSequence,
            Command::PumpRatioControl,
        ];
        for cmd in table {
            assert!(
                INIT_SEQUENCE.iter().any(|&(code, _)| code == cmd as u8),
                "{cmd:?} missing from init table"
            );
        }
        for cmd in runtime {
            assert!(!INIT_SEQUENCE.iter().any(|&(code, _)| code == cmd as u8));
        }
        // The undocumented 0xEF is the only raw code in the table.
        assert_eq!(INIT_SEQUENCE.len(), table.len() + 1);
    }

    #[test]
    fn test_window_end_bounds() {
        type Drv = Ili9341<SpiMock<u8>, PinMock, NoopDelay>;
        assert_eq!(Drv::window_end(80, 60, 32, 24), Ok((111, 83)));
        assert_eq!(Drv::window_end(319, 239, 1, 1), Ok((319, 239)));
        assert_eq!(Drv::window_end(300, 0, 32, 1), Err(SinkError::InvalidCoordinate));
        assert_eq!(Drv::window_end(0, 0, 0, 1), Err(SinkError::InvalidCoordinate));
        assert_eq!(Drv::window_end(u16::MAX, 0, 2, 1), Err(SinkError::InvalidCoordinate));
    }

    #[tokio::test]
    async fn test_set_pixel_bytes() {
        let color = WireColor::from_raw(0xF800);
        let mut expect = Expect::default();
        expect
            .window(10, 20, 10, 20)
            .command(0x2C)
            .data(&[0xF8, 0x00]);
        let (mut drv, mut spi, mut dc) = expect.driver();

        drv.set_pixel(10, 20, color).await.unwrap();

        spi.done();
        dc.done();
    }

    /// Column and page addresses go out big-endian.
    #[tokio::test]
    async fn test_blit_tile_bytes() {
        let data: Vec<WireColor> = (0..32u16 * 24)
            .map(|i| WireColor::from_raw(i.wrapping_mul(0x0101)))
            .collect();
        let mut expect = Expect::default();
        expect.command(0x2A).data(&[0x01, 0x00, 0x01, 0x1F]);
        expect.command(0x2B).data(&[0x00, 0x3C, 0x00, 0x53]);
        expect.command(0x2C).pixels(&data);
        let (mut drv, mut spi, mut dc) = expect.driver();

        drv.blit(256, 60, 32, 24, &data).await.unwrap();

        spi.done();
        dc.done();
    }

    #[tokio::test]
    async fn test_blit_rejects_wrong_length() {
        let (mut drv, mut spi, mut dc) = Expect::default().driver();
        let data = [WireColor::BLACK; 10];
        assert_eq!(
            drv.blit(0, 0, 4, 4, &data).await,
            Err(SinkError::InvalidBuffer)
        );
        assert_eq!(
            drv.blit(310, 0, 16, 1, &[WireColor::BLACK; 16]).await,
            Err(SinkError::InvalidCoordinate)
        );
        spi.done();
        dc.done();
    }

    #[tokio::test]
    async fn test_clear_streams_whole_panel() {
        let color = WireColor::from_raw(0x1234);
        let mut expect = Expect::default();
        expect.clear(color);
        let (mut drv, mut spi, mut dc) = expect.driver();

        drv.clear(color).await.unwrap();

        spi.done();
        dc.done();
    }

    #[tokio::test]
    async fn test_init_runs_table_then_powers_on() {
        let mut expect = Expect::default();
        for &(cmd, params) in INIT_SEQUENCE {
            expect.command(cmd).data(params);
        }
        expect
            .clear(WireColor::from_raw(BOOT_COLOR))
            .command(Command::WakeUp as u8)
            .command(Command::DisplayOn as u8);
        let (mut drv, mut spi, mut dc) = expect.driver();

        drv.init().await.unwrap();

        spi.done();
        dc.done();
    }

    #[test]
    fn test_info_reports_panel_size() {
        let (drv, mut spi, mut dc) = Expect::default().driver();
        assert_eq!(
            drv.info(),
            DisplayInfo {
                width: 320,
                height: 240
            }
        );
        spi.done();
        dc.done();
    }
}
