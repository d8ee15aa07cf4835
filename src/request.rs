//! Request descriptors for the controller REST API.

/// HTTP method of a descriptor. The controller endpoints used here are read-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
}

/// Everything a transport needs to issue one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    pub method: Method,
    pub url: String,
    pub params: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
}

impl RequestDescriptor {
    fn get(url: String) -> Self {
        Self {
            method: Method::Get,
            url,
            params: Vec::new(),
            headers: Vec::new(),
        }
    }

    fn param(mut self, key: &str, value: impl ToString) -> Self {
        self.params.push((key.to_string(), value.to_string()));
        self
    }

    fn header(mut self, key: &str, value: &str) -> Self {
        self.headers.push((key.to_string(), value.to_string()));
        self
    }

    /// Look up a query parameter by name.
    pub fn param_value(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Builds descriptors relative to the controller base URL.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    base_url: String,
}

impl RequestBuilder {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Metric data for one metric path between two instants.
    ///
    /// `application` and `metric_path` are passed through verbatim.
    pub fn metric_request(
        &self,
        application: &str,
        metric_path: &str,
        start_millis: i64,
        end_millis: i64,
    ) -> RequestDescriptor {
        let url = format!(
            "{}/controller/rest/applications/{}/metric-data",
            self.base_url, application
        );

        RequestDescriptor::get(url)
            .param("metric-path", metric_path)
            .param("time-range-type", "BETWEEN_TIMES")
            .param("start-time", start_millis)
            .param("end-time", end_millis)
            .param("rollup", "false")
            .param("output", "json")
            .header("Content-Type", "application/json")
    }

    /// The application listing, used by health checks and name discovery.
    pub fn application_list_request(&self) -> RequestDescriptor {
        RequestDescriptor::get(format!("{}/controller/rest/applications", self.base_url))
            .param("output", "json")
    }
}
