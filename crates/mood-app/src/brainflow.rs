//! OpenBCI acquisition through the BrainFlow `BoardController` C API,
//! loaded at runtime

use libloading::Library;
use mood_core::{acquisition_error, AcquisitionSource, BoardData, MoodResult};
use once_cell::sync::OnceCell;
use serde::Serialize;
use std::ffi::CString;
use std::os::raw::{c_char, c_double, c_int};
use tracing::{debug, info, warn};

/// BrainFlow id of the OpenBCI Cyton
pub const BOARD_ID_CYTON: c_int = 0;
const PRESET_DEFAULT: c_int = 0;
const STREAM_RINGBUF_PACKETS: c_int = 450_000;
const MAX_EEG_CHANNELS: usize = 32;

#[derive(Serialize)]
struct BrainFlowInputParams {
    serial_port: String,
    mac_address: String,
    ip_address: String,
    ip_address_aux: String,
    ip_address_anc: String,
    ip_port: i32,
    ip_port_aux: i32,
    ip_port_anc: i32,
    ip_protocol: i32,
    other_info: String,
    timeout: i32,
    serial_number: String,
    file: String,
    file_aux: String,
    file_anc: String,
    master_board: i32,
}

impl BrainFlowInputParams {
    fn for_serial(port: &str) -> Self {
        Self {
            serial_port: port.to_string(),
            mac_address: String::new(),
            ip_address: String::new(),
            ip_address_aux: String::new(),
            ip_address_anc: String::new(),
            ip_port: 0,
            ip_port_aux: 0,
            ip_port_anc: 0,
            ip_protocol: 0,
            other_info: String::new(),
            timeout: 0,
            serial_number: String::new(),
            file: String::new(),
            file_aux: String::new(),
            file_anc: String::new(),
            master_board: -100, // NO_BOARD
        }
    }
}

struct BrainFlowApi {
    #[allow(dead_code)]
    lib: Library,
    prepare_session: unsafe extern "C" fn(c_int, *const c_char) -> c_int,
    start_stream: unsafe extern "C" fn(c_int, *const c_char, c_int, *const c_char) -> c_int,
    stop_stream: unsafe extern "C" fn(c_int, *const c_char) -> c_int,
    release_session: unsafe extern "C" fn(c_int, *const c_char) -> c_int,
    get_sampling_rate: unsafe extern "C" fn(c_int, c_int, *mut c_int) -> c_int,
    get_num_rows: unsafe extern "C" fn(c_int, c_int, *mut c_int) -> c_int,
    get_eeg_channels: unsafe extern "C" fn(c_int, c_int, *mut c_int, *mut c_int) -> c_int,
    get_current_board_data:
        unsafe extern "C" fn(c_int, c_int, *mut c_double, *mut c_int, c_int, *const c_char) -> c_int,
}

impl BrainFlowApi {
    fn load() -> MoodResult<Self> {
        let name = libloading::library_filename("BoardController");
        let lib = unsafe { Library::new(&name) }
            .map_err(|e| acquisition_error!("cannot load {}: {}", name.to_string_lossy(), e))?;

        let missing = |e: libloading::Error| acquisition_error!("BoardController symbol missing: {}", e);

        // Safety: signatures follow the published BrainFlow C API
        unsafe {
            Ok(Self {
                prepare_session: *lib.get(b"prepare_session\0").map_err(missing)?,
                start_stream: *lib.get(b"start_stream\0").map_err(missing)?,
                stop_stream: *lib.get(b"stop_stream\0").map_err(missing)?,
                release_session: *lib.get(b"release_session\0").map_err(missing)?,
                get_sampling_rate: *lib.get(b"get_sampling_rate\0").map_err(missing)?,
                get_num_rows: *lib.get(b"get_num_rows\0").map_err(missing)?,
                get_eeg_channels: *lib.get(b"get_eeg_channels\0").map_err(missing)?,
                get_current_board_data: *lib.get(b"get_current_board_data\0").map_err(missing)?,
                lib,
            })
        }
    }

    fn instance() -> MoodResult<&'static BrainFlowApi> {
        static API: OnceCell<BrainFlowApi> = OnceCell::new();
        API.get_or_try_init(Self::load)
    }

    fn check(code: c_int, ctx: &str) -> MoodResult<()> {
        if code == 0 {
            Ok(())
        } else {
            Err(acquisition_error!("{} failed (BrainFlow code {})", ctx, code))
        }
    }

    fn sampling_rate(&self, board_id: c_int) -> MoodResult<c_int> {
        let mut rate: c_int = 0;
        Self::check(
            unsafe { (self.get_sampling_rate)(board_id, PRESET_DEFAULT, &mut rate) },
            "get_sampling_rate",
        )?;
        Ok(rate)
    }

    fn num_rows(&self, board_id: c_int) -> MoodResult<c_int> {
        let mut rows: c_int = 0;
        Self::check(
            unsafe { (self.get_num_rows)(board_id, PRESET_DEFAULT, &mut rows) },
            "get_num_rows",
        )?;
        Ok(rows)
    }

    fn eeg_channels(&self, board_id: c_int) -> MoodResult<Vec<usize>> {
        let mut len: c_int = 0;
        let mut buf = vec![0 as c_int; MAX_EEG_CHANNELS];
        Self::check(
            unsafe { (self.get_eeg_channels)(board_id, PRESET_DEFAULT, buf.as_mut_ptr(), &mut len) },
            "get_eeg_channels",
        )?;
        buf.truncate(len.max(0) as usize);
        Ok(buf.into_iter().map(|row| row as usize).collect())
    }
}

/// Streaming session on a BrainFlow-supported board
pub struct BrainFlowBoard {
    api: &'static BrainFlowApi,
    board_id: c_int,
    port_name: String,
    input_json: CString,
    eeg_channels: Vec<usize>,
    num_rows: usize,
    sampling_rate: f64,
    prepared: bool,
    streaming: bool,
}

impl BrainFlowBoard {
    /// Resolve board descriptors; the session itself is opened by `start`
    pub fn new(port_name: &str, board_id: i32) -> MoodResult<Self> {
        let api = BrainFlowApi::instance()?;
        let json = serde_json::to_string(&BrainFlowInputParams::for_serial(port_name))
            .map_err(|e| acquisition_error!("failed to encode BrainFlow input params: {}", e))?;
        let input_json = CString::new(json).map_err(|e| acquisition_error!("invalid port name: {}", e))?;

        let sampling_rate = api.sampling_rate(board_id)? as f64;
        let num_rows = api.num_rows(board_id)?.max(0) as usize;
        let eeg_channels = api.eeg_channels(board_id)?;

        debug!(board_id, num_rows, channels = ?eeg_channels, sampling_rate, "BrainFlow board described");
        Ok(Self {
            api,
            board_id,
            port_name: port_name.to_string(),
            input_json,
            eeg_channels,
            num_rows,
            sampling_rate,
            prepared: false,
            streaming: false,
        })
    }
}

impl AcquisitionSource for BrainFlowBoard {
    fn start(&mut self) -> MoodResult<()> {
        if !self.prepared {
            BrainFlowApi::check(
                unsafe { (self.api.prepare_session)(self.board_id, self.input_json.as_ptr()) },
                "prepare_session",
            )?;
            self.prepared = true;
        }

        if !self.streaming {
            BrainFlowApi::check(
                unsafe {
                    (self.api.start_stream)(
                        STREAM_RINGBUF_PACKETS,
                        std::ptr::null(),
                        self.board_id,
                        self.input_json.as_ptr(),
                    )
                },
                "start_stream",
            )?;
            self.streaming = true;
        }

        info!(port = %self.port_name, board_id = self.board_id, "BrainFlow stream started");
        Ok(())
    }

    /// Stop the stream and release the session; both are attempted
    fn stop(&mut self) -> MoodResult<()> {
        let mut result = Ok(());

        if self.streaming {
            self.streaming = false;
            result = BrainFlowApi::check(
                unsafe { (self.api.stop_stream)(self.board_id, self.input_json.as_ptr()) },
                "stop_stream",
            );
        }

        if self.prepared {
            self.prepared = false;
            let released = BrainFlowApi::check(
                unsafe { (self.api.release_session)(self.board_id, self.input_json.as_ptr()) },
                "release_session",
            );
            result = result.and(released);
        }

        result
    }

    fn sampling_rate(&self) -> f64 {
        self.sampling_rate
    }

    fn eeg_channels(&self) -> MoodResult<Vec<usize>> {
        Ok(self.eeg_channels.clone())
    }

    fn latest(&mut self, num_samples: usize) -> MoodResult<BoardData> {
        if !self.streaming {
            return Err(acquisition_error!("BrainFlow board is not streaming"));
        }

        let mut buffer = vec![0.0f64; self.num_rows * num_samples];
        let mut returned: c_int = 0;
        BrainFlowApi::check(
            unsafe {
                (self.api.get_current_board_data)(
                    num_samples as c_int,
                    PRESET_DEFAULT,
                    buffer.as_mut_ptr(),
                    &mut returned,
                    self.board_id,
                    self.input_json.as_ptr(),
                )
            },
            "get_current_board_data",
        )?;

        // Row-major: row r occupies buffer[r * returned..(r + 1) * returned]
        let returned = (returned.max(0) as usize).min(num_samples);
        let rows = (0..self.num_rows)
            .map(|row| buffer[row * returned..(row + 1) * returned].to_vec())
            .collect();

        Ok(BoardData::new(rows))
    }

    fn name(&self) -> &str {
        "brainflow"
    }
}

impl Drop for BrainFlowBoard {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            warn!(error = %e, "BrainFlow session release failed");
        }
    }
}
