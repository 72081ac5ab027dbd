//! 浏览器端绑定
//!
//! 与服务端使用同一套会话逻辑，前端可以直接在本地跑检测，
//! 只把事件交给界面层。时间戳由调用方传入（`performance.now()` 毫秒）。

use wasm_bindgen::prelude::*;

use crate::config::DetectorConfig;
use crate::events::Timestamp;
use crate::landmarks::LandmarkSet;
use crate::session::EyeGestureSession;

fn js_error(message: impl std::fmt::Display) -> JsValue {
    js_sys::Error::new(&message.to_string()).into()
}

#[wasm_bindgen(js_name = "EyeGestureSession")]
pub struct WasmEyeGestureSession {
    inner: EyeGestureSession,
}

#[wasm_bindgen(js_class = "EyeGestureSession")]
impl WasmEyeGestureSession {
    /// `config` 可省略（undefined/null），字段缺省时取默认值
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<WasmEyeGestureSession, JsValue> {
        let config: DetectorConfig = if config.is_undefined() || config.is_null() {
            DetectorConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config).map_err(js_error)?
        };
        let inner = EyeGestureSession::new(config).map_err(js_error)?;
        Ok(Self { inner })
    }

    /// 输入扁平坐标（每点 `dims` 个分量），返回本帧事件数组
    #[wasm_bindgen(js_name = "processLandmarks")]
    pub fn process_landmarks(
        &mut self,
        coords: &[f64],
        dims: usize,
        timestamp_ms: f64,
    ) -> Result<JsValue, JsValue> {
        let landmarks = LandmarkSet::from_flat(coords, dims).map_err(js_error)?;
        self.inner.check_frame(&landmarks).map_err(js_error)?;
        let events = self
            .inner
            .process_landmarks(Some(&landmarks), Timestamp::from_millis_f64(timestamp_ms));
        serde_wasm_bindgen::to_value(&events).map_err(js_error)
    }

    #[wasm_bindgen(js_name = "processNoFace")]
    pub fn process_no_face(&mut self, timestamp_ms: f64) -> Result<JsValue, JsValue> {
        let events = self
            .inner
            .process_landmarks(None, Timestamp::from_millis_f64(timestamp_ms));
        serde_wasm_bindgen::to_value(&events).map_err(js_error)
    }

    pub fn status(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.inner.status()).map_err(js_error)
    }

    pub fn reset(&mut self) {
        self.inner.reset();
    }
}
