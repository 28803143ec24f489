use std::fmt::Display;

use quick_xml::events::BytesDecl;
use quick_xml::events::BytesEnd;
use quick_xml::events::BytesStart;
use quick_xml::events::BytesText;
use quick_xml::events::Event;
use quick_xml::Writer;

use super::ConfigRenderer;
use crate::DataRegionConfiguration;
use crate::DataStorageConfiguration;
use crate::DiscoverySpi;
use crate::NodeConfiguration;
use crate::RenderError;
use crate::Result;

const IGNITE_CONFIGURATION_CLASS: &str = "org.apache.ignite.configuration.IgniteConfiguration";
const DATA_STORAGE_CLASS: &str = "org.apache.ignite.configuration.DataStorageConfiguration";
const DATA_REGION_CLASS: &str = "org.apache.ignite.configuration.DataRegionConfiguration";
const DISCOVERY_SPI_CLASS: &str = "org.apache.ignite.spi.discovery.tcp.TcpDiscoverySpi";
const VM_IP_FINDER_CLASS: &str = "org.apache.ignite.spi.discovery.tcp.ipfinder.vm.TcpDiscoveryVmIpFinder";

const BEANS_NAMESPACE: &str = "http://www.springframework.org/schema/beans";
const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";
const BEANS_SCHEMA_LOCATION: &str =
    "http://www.springframework.org/schema/beans http://www.springframework.org/schema/beans/spring-beans.xsd";

/// Spring bean definition of a node configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct SpringXmlRenderer;

impl ConfigRenderer for SpringXmlRenderer {
    fn render(
        &self,
        config: &NodeConfiguration,
    ) -> Result<String> {
        let mut w = BeanWriter::new();
        w.event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        let mut beans = BytesStart::new("beans");
        beans.push_attribute(("xmlns", BEANS_NAMESPACE));
        beans.push_attribute(("xmlns:xsi", XSI_NAMESPACE));
        beans.push_attribute(("xsi:schemaLocation", BEANS_SCHEMA_LOCATION));
        w.event(Event::Start(beans))?;

        w.open_bean(IGNITE_CONFIGURATION_CLASS)?;
        w.property("clientMode", config.client_mode())?;
        w.opt_property("consistentId", config.consistent_id())?;
        w.property("peerClassLoadingEnabled", config.peer_class_loading_enabled())?;
        w.property("failureDetectionTimeout", config.failure_detection_timeout())?;

        if !config.metric_exporters().is_empty() {
            w.open_property("metricExporterSpi")?;
            w.open("list")?;
            for exporter in config.metric_exporters() {
                w.empty_bean(exporter.class_name())?;
            }
            w.close("list")?;
            w.close("property")?;
        }

        if let Some(discovery) = config.discovery_spi() {
            w.open_property("discoverySpi")?;
            render_discovery(&mut w, discovery)?;
            w.close("property")?;
        }

        if let Some(storage) = config.data_storage() {
            w.open_property("dataStorageConfiguration")?;
            render_data_storage(&mut w, storage)?;
            w.close("property")?;
        }

        w.close("bean")?;
        w.close("beans")?;

        w.finish()
    }

    fn extension(&self) -> &'static str {
        "xml"
    }
}

fn render_discovery(
    w: &mut BeanWriter,
    discovery: &DiscoverySpi,
) -> Result<()> {
    w.open_bean(DISCOVERY_SPI_CLASS)?;
    w.opt_property("localPort", discovery.local_port())?;
    w.opt_property("localPortRange", discovery.local_port_range())?;

    w.open_property("ipFinder")?;
    w.open_bean(VM_IP_FINDER_CLASS)?;
    w.open_property("addresses")?;
    w.open("list")?;
    for address in discovery.addresses() {
        w.value(address)?;
    }
    w.close("list")?;
    w.close("property")?;
    w.close("bean")?;
    w.close("property")?;

    w.close("bean")?;
    Ok(())
}

fn render_data_storage(
    w: &mut BeanWriter,
    storage: &DataStorageConfiguration,
) -> Result<()> {
    w.open_bean(DATA_STORAGE_CLASS)?;

    w.open_property("defaultDataRegionConfiguration")?;
    render_data_region(w, storage.default_region())?;
    w.close("property")?;

    if !storage.regions().is_empty() {
        w.open_property("dataRegionConfigurations")?;
        w.open("list")?;
        for region in storage.regions() {
            render_data_region(w, region)?;
        }
        w.close("list")?;
        w.close("property")?;
    }

    w.opt_property("pageSize", storage.page_size())?;
    w.opt_property("walMode", storage.wal_mode().map(|m| m.as_str()))?;
    w.opt_property("walPath", storage.wal_path())?;
    w.opt_property("walArchivePath", storage.wal_archive_path())?;
    w.opt_property("cdcWalPath", storage.cdc_wal_path())?;
    w.opt_property("walSegmentSize", storage.wal_segment_size())?;
    w.opt_property("walBufferSize", storage.wal_buffer_size())?;
    w.opt_property("walHistorySize", storage.wal_history_size())?;
    w.opt_property("maxWalArchiveSize", storage.max_wal_archive_size())?;
    w.opt_property("walCompactionEnabled", storage.wal_compaction_enabled())?;
    w.opt_property(
        "writeRecoveryDataOnCheckpoint",
        storage.write_recovery_data_on_checkpoint(),
    )?;
    w.opt_property("walForceArchiveTimeout", storage.wal_force_archive_timeout())?;
    w.opt_property("checkpointFrequency", storage.checkpoint_frequency())?;
    w.opt_property("metricsRateTimeInterval", storage.metrics_rate_time_interval())?;
    w.opt_property("walPageCompression", storage.wal_page_compression().map(|c| c.as_str()))?;
    w.opt_property("walPageCompressionLevel", storage.wal_page_compression_level())?;
    w.opt_property(
        "checkpointRecoveryDataCompression",
        storage.checkpoint_recovery_data_compression().map(|c| c.as_str()),
    )?;
    w.opt_property(
        "checkpointRecoveryDataCompressionLevel",
        storage.checkpoint_recovery_data_compression_level(),
    )?;
    w.property("metricsEnabled", storage.metrics_enabled())?;

    if let Some(warm_up) = storage.default_warm_up_configuration() {
        w.open_property("defaultWarmUpConfiguration")?;
        w.empty_bean(warm_up.class_name())?;
        w.close("property")?;
    }

    w.close("bean")?;
    Ok(())
}

fn render_data_region(
    w: &mut BeanWriter,
    region: &DataRegionConfiguration,
) -> Result<()> {
    w.open_bean(DATA_REGION_CLASS)?;
    w.property("name", region.name())?;
    w.property("persistenceEnabled", region.persistence_enabled())?;
    w.property("initialSize", region.initial_size())?;
    w.property("maxSize", region.max_size())?;
    w.property("metricsEnabled", region.metrics_enabled())?;
    w.opt_property("metricsRateTimeInterval", region.metrics_rate_time_interval())?;
    w.opt_property("checkpointPageBufferSize", region.checkpoint_page_buffer_size())?;
    w.opt_property("cdcEnabled", region.cdc_enabled())?;
    w.opt_property("lazyMemoryAllocation", region.lazy_memory_allocation())?;

    if let Some(warm_up) = region.warm_up_configuration() {
        w.open_property("warmUpConfiguration")?;
        w.empty_bean(warm_up.class_name())?;
        w.close("property")?;
    }

    w.close("bean")?;
    Ok(())
}

/// Indenting bean-definition writer over quick_xml events
struct BeanWriter {
    inner: Writer<Vec<u8>>,
}

impl BeanWriter {
    fn new() -> Self {
        Self {
            inner: Writer::new_with_indent(Vec::new(), b' ', 4),
        }
    }

    fn event(
        &mut self,
        event: Event<'_>,
    ) -> Result<()> {
        self.inner
            .write_event(event)
            .map_err(|e| RenderError::Xml(e.to_string()))?;
        Ok(())
    }

    fn open(
        &mut self,
        tag: &str,
    ) -> Result<()> {
        self.event(Event::Start(BytesStart::new(tag)))
    }

    fn close(
        &mut self,
        tag: &str,
    ) -> Result<()> {
        self.event(Event::End(BytesEnd::new(tag)))
    }

    fn open_bean(
        &mut self,
        class: &str,
    ) -> Result<()> {
        self.event(Event::Start(bean(class)))
    }

    fn empty_bean(
        &mut self,
        class: &str,
    ) -> Result<()> {
        self.event(Event::Empty(bean(class)))
    }

    fn open_property(
        &mut self,
        name: &str,
    ) -> Result<()> {
        let mut property = BytesStart::new("property");
        property.push_attribute(("name", name));
        self.event(Event::Start(property))
    }

    fn property(
        &mut self,
        name: &str,
        value: impl Display,
    ) -> Result<()> {
        let value = value.to_string();
        let mut property = BytesStart::new("property");
        property.push_attribute(("name", name));
        property.push_attribute(("value", value.as_str()));
        self.event(Event::Empty(property))
    }

    fn opt_property<T: Display>(
        &mut self,
        name: &str,
        value: Option<T>,
    ) -> Result<()> {
        match value {
            Some(value) => self.property(name, value),
            None => Ok(()),
        }
    }

    fn value(
        &mut self,
        value: &str,
    ) -> Result<()> {
        self.open("value")?;
        self.event(Event::Text(BytesText::new(value)))?;
        self.close("value")
    }

    fn finish(self) -> Result<String> {
        String::from_utf8(self.inner.into_inner()).map_err(|e| RenderError::Xml(e.to_string()).into())
    }
}

fn bean(class: &str) -> BytesStart<'_> {
    let mut bean = BytesStart::new("bean");
    bean.push_attribute(("class", class));
    bean
}
