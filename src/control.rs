use core::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};
use usb_device::{Result, UsbError};

pub const REQ_SEND_ENCAPSULATED_COMMAND: u8 = 0x00;
pub const REQ_GET_ENCAPSULATED_RESPONSE: u8 = 0x01;
pub const REQ_SET_COMM_FEATURE: u8 = 0x02;
pub const REQ_GET_COMM_FEATURE: u8 = 0x03;
pub const REQ_CLEAR_COMM_FEATURE: u8 = 0x04;
pub const REQ_SET_LINE_CODING: u8 = 0x20;
pub const REQ_GET_LINE_CODING: u8 = 0x21;
pub const REQ_SET_CONTROL_LINE_STATE: u8 = 0x22;
pub const REQ_SEND_BREAK: u8 = 0x23;

/// Size of the line coding structure on the wire.
pub const LINE_CODING_LEN: usize = 7;

/// Number of stop bits for LineCoding
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum StopBits {
    /// 1 stop bit
    One = 0,

    /// 1.5 stop bits
    OnePointFive = 1,

    /// 2 stop bits
    Two = 2,
}

impl From<u8> for StopBits {
    fn from(value: u8) -> Self {
        match value {
            1 => StopBits::OnePointFive,
            2 => StopBits::Two,
            _ => StopBits::One,
        }
    }
}

/// Parity for LineCoding
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ParityType {
    None = 0,
    Odd = 1,
    Even = 2,
    Mark = 3,
    Space = 4,
}

impl From<u8> for ParityType {
    fn from(value: u8) -> Self {
        match value {
            1 => ParityType::Odd,
            2 => ParityType::Even,
            3 => ParityType::Mark,
            4 => ParityType::Space,
            _ => ParityType::None,
        }
    }
}

/// Line coding parameters
///
/// This is provided by the host for specifying the standard UART parameters such as baud rate. Can
/// be ignored if you don't plan to interface with a physical UART.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct LineCoding {
    stop_bits: StopBits,
    data_bits: u8,
    parity_type: ParityType,
    data_rate: u32,
}

impl LineCoding {
    /// Gets the number of stop bits for UART communication.
    pub fn stop_bits(&self) -> StopBits {
        self.stop_bits
    }

    /// Gets the number of data bits for UART communication.
    pub fn data_bits(&self) -> u8 {
        self.data_bits
    }

    /// Gets the parity type for UART communication.
    pub fn parity_type(&self) -> ParityType {
        self.parity_type
    }

    /// Gets the data rate in bits per second for UART communication.
    pub fn data_rate(&self) -> u32 {
        self.data_rate
    }

    /// Parses the 7-byte wire form sent with SET_LINE_CODING.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < LINE_CODING_LEN {
            return Err(UsbError::ParseError);
        }

        Ok(LineCoding {
            data_rate: u32::from_le_bytes([data[0], data[1], data[2], data[3]]),
            stop_bits: data[4].into(),
            parity_type: data[5].into(),
            data_bits: data[6],
        })
    }

    /// Writes the 7-byte wire form answered to GET_LINE_CODING.
    pub fn write_to(&self, buf: &mut [u8]) -> Result<usize> {
        if buf.len() < LINE_CODING_LEN {
            return Err(UsbError::BufferOverflow);
        }

        buf[0..4].copy_from_slice(&self.data_rate.to_le_bytes());
        buf[4] = self.stop_bits as u8;
        buf[5] = self.parity_type as u8;
        buf[6] = self.data_bits;

        Ok(LINE_CODING_LEN)
    }
}

impl Default for LineCoding {
    fn default() -> Self {
        LineCoding {
            stop_bits: StopBits::One,
            data_bits: 8,
            parity_type: ParityType::None,
            data_rate: 115_200,
        }
    }
}

/// Line coding and control line state written by the control-request handler and read by the
/// client. Fields are updated one by one, so a reader racing a SET_LINE_CODING may see a mix.
pub(crate) struct ControlState {
    data_rate: AtomicU32,
    stop_bits: AtomicU8,
    parity_type: AtomicU8,
    data_bits: AtomicU8,
    dtr: AtomicBool,
    rts: AtomicBool,
}

impl ControlState {
    pub const fn new() -> Self {
        ControlState {
            data_rate: AtomicU32::new(115_200),
            stop_bits: AtomicU8::new(StopBits::One as u8),
            parity_type: AtomicU8::new(ParityType::None as u8),
            data_bits: AtomicU8::new(8),
            dtr: AtomicBool::new(false),
            rts: AtomicBool::new(false),
        }
    }

    pub fn line_coding(&self) -> LineCoding {
        LineCoding {
            data_rate: self.data_rate.load(Ordering::Relaxed),
            stop_bits: self.stop_bits.load(Ordering::Relaxed).into(),
            parity_type: self.parity_type.load(Ordering::Relaxed).into(),
            data_bits: self.data_bits.load(Ordering::Relaxed),
        }
    }

    pub fn dtr(&self) -> bool {
        self.dtr.load(Ordering::Relaxed)
    }

    pub fn rts(&self) -> bool {
        self.rts.load(Ordering::Relaxed)
    }

    /// Handles one class-specific control request. `value` is the setup packet's wValue and `data`
    /// the request's data stage. Returns the number of bytes written to `data` for IN requests.
    pub fn handle(&self, request: u8, value: u16, data: &mut [u8]) -> Result<usize> {
        match request {
            REQ_SET_LINE_CODING => {
                let coding = LineCoding::parse(data)?;
                self.data_rate.store(coding.data_rate, Ordering::Relaxed);
                self.stop_bits.store(coding.stop_bits as u8, Ordering::Relaxed);
                self.parity_type.store(coding.parity_type as u8, Ordering::Relaxed);
                self.data_bits.store(coding.data_bits, Ordering::Relaxed);
                Ok(0)
            }
            REQ_GET_LINE_CODING => self.line_coding().write_to(data),
            REQ_SET_CONTROL_LINE_STATE => {
                self.dtr.store(value & 0x0001 != 0, Ordering::Relaxed);
                self.rts.store(value & 0x0002 != 0, Ordering::Relaxed);
                Ok(0)
            }
            REQ_SEND_ENCAPSULATED_COMMAND
            | REQ_GET_ENCAPSULATED_RESPONSE
            | REQ_SET_COMM_FEATURE
            | REQ_GET_COMM_FEATURE
            | REQ_CLEAR_COMM_FEATURE
            | REQ_SEND_BREAK => Ok(0),
            _ => Err(UsbError::Unsupported),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 9600 baud, 2 stop bits, even parity, 7 data bits
    const CODING: [u8; 7] = [0x80, 0x25, 0x00, 0x00, 0x02, 0x02, 0x07];

    #[test]
    fn default_coding() {
        let state = ControlState::new();
        assert_eq!(state.line_coding(), LineCoding::default());

        let mut buf = [0u8; 7];
        assert_eq!(state.handle(REQ_GET_LINE_CODING, 0, &mut buf), Ok(7));
        assert_eq!(buf, [0x00, 0xC2, 0x01, 0x00, 0x00, 0x00, 0x08]);
    }

    #[test]
    fn set_then_get_line_coding() {
        let state = ControlState::new();
        let mut data = CODING;
        assert_eq!(state.handle(REQ_SET_LINE_CODING, 0, &mut data), Ok(0));

        let coding = state.line_coding();
        assert_eq!(coding.data_rate(), 9600);
        assert_eq!(coding.stop_bits(), StopBits::Two);
        assert_eq!(coding.parity_type(), ParityType::Even);
        assert_eq!(coding.data_bits(), 7);

        let mut buf = [0u8; 8];
        assert_eq!(state.handle(REQ_GET_LINE_CODING, 0, &mut buf), Ok(7));
        assert_eq!(&buf[..7], &CODING);
    }

    #[test]
    fn short_line_coding() {
        let state = ControlState::new();
        let mut short = [0u8; 4];

        assert_eq!(state.handle(REQ_SET_LINE_CODING, 0, &mut short), Err(UsbError::ParseError));
        assert_eq!(state.handle(REQ_GET_LINE_CODING, 0, &mut short), Err(UsbError::BufferOverflow));
        assert_eq!(state.line_coding(), LineCoding::default());
    }

    #[test]
    fn control_line_state() {
        let state = ControlState::new();

        state.handle(REQ_SET_CONTROL_LINE_STATE, 0x0003, &mut []).unwrap();
        assert!(state.dtr());
        assert!(state.rts());

        state.handle(REQ_SET_CONTROL_LINE_STATE, 0x0002, &mut []).unwrap();
        assert!(!state.dtr());
        assert!(state.rts());
    }

    #[test]
    fn ignored_and_unknown_requests() {
        let state = ControlState::new();

        assert_eq!(state.handle(REQ_SEND_BREAK, 0xffff, &mut []), Ok(0));
        assert_eq!(state.handle(REQ_SET_COMM_FEATURE, 0, &mut []), Ok(0));
        assert_eq!(state.handle(0x7f, 0, &mut []), Err(UsbError::Unsupported));
    }
}
